//! `deploy` command handler.

use deploy_core::ExitCode;

use crate::app::context::RunContext;
use crate::app::deploy_orchestrator::run_deploy;
use crate::app::exit_handler::determine_exit_code;
use crate::cli::DeployArgs;

pub(crate) async fn handle(ctx: &RunContext, args: &DeployArgs) -> ExitCode {
    let result = run_deploy(ctx, args).await;

    match &result {
        Ok(true) => tracing::info!(profile = %args.profile, "deployment succeeded"),
        Ok(false) => tracing::error!(profile = %args.profile, "deployment finished with failures"),
        Err(err) => tracing::error!(profile = %args.profile, error = %err, "deployment failed"),
    }

    determine_exit_code(&result)
}
