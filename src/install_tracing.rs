use miette::Context;
use miette::IntoDiagnostic;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

/// Log to stderr, filtered by `filter_directives`.
///
/// Warnings (like broken `git blame` output) are shown by default; `debug` shows each `git`
/// command and `trace` shows every line read from it.
pub fn install_tracing(filter_directives: &str) -> miette::Result<()> {
    let env_filter = EnvFilter::try_new(filter_directives)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to parse log filter `{filter_directives}`"))?;

    tracing_subscriber::registry()
        .with(
            tracing_human_layer::HumanLayer::new()
                .with_output_writer(std::io::stderr())
                .with_filter(env_filter),
        )
        .init();

    Ok(())
}
