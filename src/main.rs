use {
  crate::{
    arguments::Arguments,
    classifier::{Classifier, Engine},
    config::*,
    downloader::{
      Connectivity, CustomModel, DownloadConditions, DownloadType,
      Downloader, FixedNetwork, NetworkMonitor,
    },
    error::Error,
    labels::LabelTable,
    math::*,
    network::Network,
    pipeline::Pipeline,
    prediction::{Prediction, ScoreInterpretation},
    provision::{ModelSlot, ModelSource, Provisioner},
    subcommand::Subcommand,
  },
  anyhow::{bail, Context},
  clap::{Args, Parser, ValueEnum},
  image::{imageops::FilterType, DynamicImage},
  indicatif::{ProgressBar, ProgressStyle},
  ndarray::{Array1, Array2, ArrayView1},
  ndarray_rand::{rand_distr::Uniform, RandomExt},
  rand::seq::SliceRandom,
  rayon::prelude::*,
  serde::{Deserialize, Serialize},
  std::{
    fmt::{self, Display, Formatter},
    fs::{self, File},
    io::{BufReader, Read},
    mem,
    path::{Path, PathBuf},
    process,
    sync::{Arc, Mutex, MutexGuard, RwLock},
    thread::{self, JoinHandle},
  },
  tracing::{debug, error, info, warn},
};

mod arguments;
mod classifier;
mod config;
mod downloader;
mod error;
mod labels;
mod logging;
mod math;
mod network;
mod pipeline;
mod prediction;
mod preprocess;
mod provision;
mod subcommand;

type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;

fn main() {
  if let Err(error) = Arguments::parse().run() {
    eprintln!("error: {error:#}");
    process::exit(1);
  }
}
