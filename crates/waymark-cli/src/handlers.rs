//! Command handlers

use crate::commands::{CheckArgs, ReplayArgs};
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use waymark::{
    ActionChainRunner, Chain, ChainResult, ChainScript, GroupLifecycle, ProbeRole,
    ScriptedDriver, SessionState, WaymarkConfig,
};

/// Validate a script and list its screens and chains
pub fn run_check(args: &CheckArgs, reporter: &ProgressReporter) -> CliResult<()> {
    let script = ChainScript::load(&args.script)?;

    reporter.header("Screens");
    for (id, screen) in script.screens() {
        let fallbacks = screen
            .probes()
            .iter()
            .filter(|p| p.role == ProbeRole::Fallback)
            .count();
        reporter.info(&format!(
            "{id}: {} probe(s), {fallbacks} fallback",
            screen.probes().len()
        ));
    }

    reporter.header("Chains");
    for spec in script.chain_specs() {
        reporter.info(&format!(
            "{}: {} setup, {} step(s){}",
            spec.name,
            spec.setup.len(),
            spec.steps.len(),
            if spec.hand_off { ", hands off" } else { "" }
        ));
    }

    reporter.success(&format!("{} is valid", args.script.display()));
    Ok(())
}

/// Load configuration from an optional file, then apply the environment
pub fn load_config(args: &ReplayArgs) -> CliResult<WaymarkConfig> {
    let config = match &args.config {
        Some(path) => WaymarkConfig::load(path)?,
        None => WaymarkConfig::default(),
    }
    .with_env_overrides();
    config
        .validate()
        .map_err(|e| CliError::config(e.to_string()))?;
    Ok(config)
}

/// Replay chains against the scripted application
///
/// Chains run in declared order inside one group, so hand-off flags set by
/// one chain are visible to the next.
pub fn run_replay(
    args: &ReplayArgs,
    config: &WaymarkConfig,
    reporter: &mut ProgressReporter,
) -> CliResult<Vec<ChainResult>> {
    let script = ChainScript::load(&args.script)?;
    let driver = ScriptedDriver::load(&args.app)?;

    let chains: Vec<Chain> = match &args.chain {
        Some(name) => vec![script.chain(name)?],
        None => script.chains()?,
    };
    if chains.is_empty() {
        return Err(CliError::invalid_argument(format!(
            "{} declares no chains",
            args.script.display()
        )));
    }

    let runner = ActionChainRunner::from_config(&driver, config);
    let mut state = SessionState::new();
    let mut group = GroupLifecycle::begin("replay", &mut state);

    if !args.json {
        reporter.start_progress(chains.len() as u64, "replaying");
    }
    let mut results = Vec::with_capacity(chains.len());
    for chain in &chains {
        tracing::info!(chain = %chain.name, "replaying chain");
        let result = runner.run(chain, group.state());
        if !args.json {
            reporter.chain_result(&result);
            reporter.increment(1);
        }
        results.push(result);
    }
    reporter.finish();
    let _ = group.end();

    Ok(results)
}
