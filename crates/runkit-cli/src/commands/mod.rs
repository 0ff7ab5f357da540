mod cicd;
mod deploy;
mod manage;
mod setup;

pub use cicd::{CicdAction, cicd};
pub use deploy::{DeployAction, deploy};
pub use manage::{ManageAction, manage};
pub use setup::{SetupAction, setup};
