use {
  super::*, evaluate::Evaluate, init_model::InitModel, predict::Predict,
  shared::ModelArguments,
};

mod evaluate;
mod init_model;
mod predict;
mod shared;

#[derive(Debug, Parser)]
pub(crate) enum Subcommand {
  #[clap(
    name = "evaluate",
    about = "Measure accuracy over a labelled set of images"
  )]
  Evaluate(Evaluate),
  #[clap(
    name = "init-model",
    about = "Write a randomly initialized model artifact"
  )]
  InitModel(InitModel),
  #[clap(name = "predict", about = "Predict the dish shown in an image")]
  Predict(Predict),
}

impl Subcommand {
  pub(crate) fn run(self, config: Config) -> Result {
    match self {
      Self::Evaluate(evaluate) => evaluate.run(config),
      Self::InitModel(init_model) => init_model.run(),
      Self::Predict(predict) => predict.run(config),
    }
  }
}
