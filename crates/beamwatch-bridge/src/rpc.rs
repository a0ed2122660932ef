use std::path::Path;
use std::time::Duration;

use beamwatch_core::config::CompanionConfig;

use crate::error::BridgeError;
use crate::process::CompanionProcess;
use crate::xmlrpc::{self, Value};
use crate::{CompanionBridge, Verb};

const QUIT_GRACE: Duration = Duration::from_secs(2);

/// XML-RPC over HTTP to the companion, optionally owning its process.
pub struct XmlRpcBridge {
    endpoint: String,
    /// Bounded by the configured call timeout.
    agent: ureq::Agent,
    /// Bounded by the shorter liveness probe timeout.
    probe: ureq::Agent,
    process: Option<CompanionProcess>,
}

impl XmlRpcBridge {
    /// Build the bridge. Does not launch or contact the companion.
    pub fn new(config: &CompanionConfig) -> Self {
        Self {
            endpoint: format!("http://{}:{}/RPC2", config.host, config.port),
            agent: agent_with_timeout(Duration::from_secs(config.timeout_secs)),
            probe: agent_with_timeout(Duration::from_secs(config.probe_timeout_secs)),
            process: config
                .command
                .clone()
                .map(|cmd| CompanionProcess::new(cmd, config.port)),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Launch the companion if a command was configured.
    pub fn start(&mut self) -> Result<(), BridgeError> {
        match self.process.as_mut() {
            Some(process) => process.start(),
            None => Ok(()),
        }
    }

    fn call(&self, agent: &ureq::Agent, verb: Verb, params: &[&str]) -> Result<Value, BridgeError> {
        let body = xmlrpc::encode_call(verb.as_str(), params);
        tracing::debug!(%verb, endpoint = %self.endpoint, "companion call");
        let mut response = agent
            .post(&self.endpoint)
            .header("Content-Type", "text/xml")
            .send(&body)
            .map_err(BridgeError::from_ureq)?;
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(BridgeError::from_ureq)?;
        xmlrpc::decode_response(&text)
    }

    fn command(&self, verb: Verb, path: Option<&Path>) -> Result<(), BridgeError> {
        let arg = path.map(|p| p.to_string_lossy().into_owned());
        let params: Vec<&str> = arg.iter().map(String::as_str).collect();
        self.call(&self.agent, verb, &params).map(|_| ())
    }
}

fn agent_with_timeout(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}

impl CompanionBridge for XmlRpcBridge {
    fn is_alive(&mut self) -> bool {
        if let Some(process) = self.process.as_mut() {
            if !process.is_running() {
                return false;
            }
        }
        match self.call(&self.probe, Verb::IsAlive, &[]) {
            Ok(value) => value != Value::Bool(false),
            Err(e) => {
                tracing::debug!(error = %e, "companion liveness probe failed");
                false
            }
        }
    }

    fn update_model(&mut self, model: &Path) -> Result<(), BridgeError> {
        self.command(Verb::UpdateModel, Some(model))
    }

    fn close_maps(&mut self) -> Result<(), BridgeError> {
        self.command(Verb::CloseMaps, None)
    }

    fn auto_load_maps(&mut self, maps: &Path) -> Result<(), BridgeError> {
        self.command(Verb::AutoLoadMaps, Some(maps))
    }

    fn auto_load_anom_maps(&mut self, maps: &Path) -> Result<(), BridgeError> {
        self.command(Verb::AutoLoadAnomMaps, Some(maps))
    }

    /// Ask the companion to exit, then make sure an owned process is gone.
    fn quit(&mut self) -> Result<(), BridgeError> {
        let result = self.call(&self.probe, Verb::Quit, &[]).map(|_| ());
        if let Some(process) = self.process.as_mut() {
            process.stop(QUIT_GRACE);
        }
        result
    }
}
