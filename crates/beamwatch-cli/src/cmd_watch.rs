use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

use beamwatch_bridge::{CompanionBridge, DetachedBridge, XmlRpcBridge};
use beamwatch_core::config::MonitorConfig;
use beamwatch_core::{DirectoryScanner, Layout, MapKind};
use beamwatch_monitor::{runner, PollController, UserCommand};

use crate::display::{navigation_line, TerminalSink};

pub struct WatchParams<'a> {
    pub directory: PathBuf,
    pub interval: Option<u64>,
    pub layout: Option<Layout>,
    pub anomalous: bool,
    pub port: Option<u16>,
    pub timeout: Option<u64>,
    pub no_companion: bool,
    pub config: Option<&'a Path>,
    pub companion_cmd: Vec<String>,
}

pub fn execute(params: WatchParams<'_>) -> anyhow::Result<()> {
    let mut config = MonitorConfig::discover(params.config, &params.directory)?;
    apply_overrides(&mut config, &params);
    config.validate()?;

    let scanner = DirectoryScanner::new(&params.directory, config.layout)?;
    let map_kind = config.effective_map_kind();
    let bridge = build_bridge(&config);
    tracing::info!(
        directory = %scanner.directory().display(),
        layout = %config.layout,
        ?map_kind,
        interval_secs = config.interval_secs,
        "watching"
    );

    let mut controller = PollController::new(
        scanner,
        map_kind,
        bridge,
        TerminalSink::new(std::io::stdout()),
    );
    println!("{}", navigation_line(controller.navigation_state()));

    let (tx, rx) = mpsc::channel();
    spawn_key_reader(tx.clone());
    let ctrlc_tx = tx.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(UserCommand::Quit);
    }) {
        tracing::warn!(error = %e, "cannot install Ctrl-C handler");
    }

    let stats = runner::run(
        &mut controller,
        &rx,
        Duration::from_secs(config.interval_secs),
    );
    drop(tx);
    tracing::info!(
        ticks = stats.ticks,
        commands = stats.commands,
        groups = controller.store().len(),
        "stopped"
    );
    Ok(())
}

/// Command-line flags win over the config file.
fn apply_overrides(config: &mut MonitorConfig, params: &WatchParams<'_>) {
    if let Some(interval) = params.interval {
        config.interval_secs = interval;
    }
    if let Some(layout) = params.layout {
        config.layout = layout;
    }
    if params.anomalous {
        config.map_kind = Some(MapKind::Anomalous);
    }
    if let Some(port) = params.port {
        config.companion.port = port;
    }
    if let Some(timeout) = params.timeout {
        config.companion.timeout_secs = timeout;
    }
    if params.no_companion {
        config.companion.enabled = false;
    }
    if !params.companion_cmd.is_empty() {
        config.companion.command = Some(params.companion_cmd.clone());
    }
}

fn build_bridge(config: &MonitorConfig) -> Box<dyn CompanionBridge> {
    if !config.companion.enabled {
        tracing::info!("companion disabled, display only");
        return Box::new(DetachedBridge);
    }
    let mut bridge = XmlRpcBridge::new(&config.companion);
    if let Err(e) = bridge.start() {
        tracing::warn!(error = %e, "companion did not start, continuing without it");
    }
    tracing::info!(endpoint = bridge.endpoint(), "companion endpoint");
    Box::new(bridge)
}

/// Forward navigation keys typed on stdin, one per line.
fn spawn_key_reader(tx: Sender<UserCommand>) {
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match UserCommand::from_key(&line) {
                Some(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => eprintln!("unknown key '{}' (p, n, l, s, q)", line.trim()),
            }
        }
        tracing::debug!("stdin closed, navigation keys unavailable");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(directory: &Path) -> WatchParams<'static> {
        WatchParams {
            directory: directory.to_path_buf(),
            interval: None,
            layout: None,
            anomalous: false,
            port: None,
            timeout: None,
            no_companion: false,
            config: None,
            companion_cmd: Vec::new(),
        }
    }

    #[test]
    fn flags_override_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("beamwatch.json"),
            r#"{"interval_secs": 30, "layout": "nested", "companion": {"port": 41000}}"#,
        )
        .unwrap();

        let mut p = params(tmp.path());
        p.interval = Some(2);
        p.anomalous = true;
        p.no_companion = true;
        p.companion_cmd = vec!["coot".into()];

        let mut config = MonitorConfig::discover(None, tmp.path()).unwrap();
        apply_overrides(&mut config, &p);
        assert_eq!(config.interval_secs, 2);
        assert_eq!(config.layout, Layout::Nested);
        assert_eq!(config.companion.port, 41000);
        assert_eq!(config.effective_map_kind(), MapKind::Anomalous);
        assert!(!config.companion.enabled);
        assert_eq!(config.companion.command, Some(vec!["coot".to_string()]));
    }

    #[test]
    fn no_flags_keeps_config() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = MonitorConfig::default();
        apply_overrides(&mut config, &params(tmp.path()));
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn zero_interval_rejected_before_watching() {
        let tmp = tempfile::tempdir().unwrap();
        let mut p = params(tmp.path());
        p.interval = Some(0);
        let err = execute(p).unwrap_err();
        assert!(err.to_string().contains("interval_secs"));
    }

    #[test]
    fn missing_directory_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let mut p = params(&tmp.path().join("absent"));
        p.no_companion = true;
        let err = execute(p).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn disabled_companion_is_detached() {
        let mut config = MonitorConfig::default();
        config.companion.enabled = false;
        let mut bridge = build_bridge(&config);
        assert!(!bridge.is_alive());
    }
}
