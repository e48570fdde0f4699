//! Line-oriented CLI driver over a plain TCP session (telnet-style consoles,
//! terminal servers, lab simulators).
//!
//! The session answers `Username:` / `Password:` prompts from the device
//! credentials, then treats any last line ending in `#` or `>` as the prompt.
//! Getters are not available on this transport.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use fleetr_common::inventory::{Credentials, Device};
use fleetr_common::models::{Facts, Interfaces};

use crate::config_tree::ConfigTree;
use crate::driver::{ConnectOptions, Connector, DeviceDriver, DriverError, LoadMode};
use crate::registry::CLI_PLATFORM;

pub const DEFAULT_PORT: u16 = 23;

const MAX_LOGIN_PROMPTS: usize = 4;
const REJECT_MARKERS: &[&str] = &["% Invalid", "% Incomplete", "% Ambiguous"];
/// Status lines `show running-config` prints ahead of the configuration.
const RUNNING_PREAMBLE: &[&str] = &[
    "Building configuration",
    "Current configuration",
    "Last configuration change",
    "NVRAM config last updated",
];

pub struct TcpCliConnector;

#[async_trait]
impl Connector for TcpCliConnector {
    async fn connect(
        &self,
        device: &Device,
        options: &ConnectOptions,
    ) -> Result<Box<dyn DeviceDriver>, DriverError> {
        let port = device.port.unwrap_or(DEFAULT_PORT);
        let target = (device.hostname.as_str(), port);

        let stream = match timeout(options.connect_timeout, TcpStream::connect(target)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(DriverError::Connect {
                    host: format!("{}:{port}", device.hostname),
                    reason: e.to_string(),
                });
            }
            Err(_elapsed) => return Err(DriverError::Timeout(options.connect_timeout)),
        };
        debug!(device = %device.name, port, "tcp session established");

        let mut driver = TcpCliDriver {
            stream,
            command_timeout: options.command_timeout,
            candidate: None,
            closed: false,
        };
        driver
            .login(&device.hostname, &device.credentials, options.connect_timeout)
            .await?;
        driver.cli("terminal length 0").await?;

        Ok(Box::new(driver))
    }
}

pub struct TcpCliDriver {
    stream: TcpStream,
    command_timeout: Duration,
    candidate: Option<(ConfigTree, LoadMode)>,
    closed: bool,
}

enum LoginPrompt {
    Username,
    Password,
}

impl TcpCliDriver {
    async fn login(
        &mut self,
        host: &str,
        credentials: &Credentials,
        limit: Duration,
    ) -> Result<(), DriverError> {
        for _ in 0..MAX_LOGIN_PROMPTS {
            let banner = self
                .read_until(|buf| is_prompt(buf) || login_prompt(buf).is_some(), limit)
                .await?;

            let answer = match login_prompt(&banner) {
                Some(LoginPrompt::Username) => credentials.username.as_deref(),
                Some(LoginPrompt::Password) => credentials.password.as_deref(),
                None => return Ok(()),
            };
            self.send(answer.unwrap_or("")).await?;
        }

        Err(DriverError::Connect {
            host: host.to_string(),
            reason: "authentication failed".to_string(),
        })
    }

    async fn send(&mut self, line: &str) -> Result<(), DriverError> {
        self.stream.write_all(format!("{line}\n").as_bytes()).await?;
        Ok(())
    }

    async fn read_until<F>(&mut self, done: F, limit: Duration) -> Result<String, DriverError>
    where
        F: Fn(&str) -> bool + Send + Sync,
    {
        let buf = timeout(limit, read_into(&mut self.stream, &done))
            .await
            .map_err(|_elapsed| DriverError::Timeout(limit))??;
        Ok(buf.replace('\r', ""))
    }

    async fn exec(&mut self, command: &str) -> Result<String, DriverError> {
        if self.closed {
            return Err(DriverError::Closed);
        }
        self.send(command).await?;
        let raw = self.read_until(is_prompt, self.command_timeout).await?;
        Ok(strip_echo_and_prompt(&raw, command))
    }

    async fn target_config(&mut self) -> Result<Option<(ConfigTree, ConfigTree)>, DriverError> {
        let Some((candidate, mode)) = self.candidate.clone() else {
            return Ok(None);
        };
        let running = parse_running(&self.exec("show running-config").await?);
        let mut target = match mode {
            LoadMode::Merge => running.clone(),
            LoadMode::Replace => ConfigTree::default(),
        };
        target.merge(&candidate);
        Ok(Some((running, target)))
    }
}

#[async_trait]
impl DeviceDriver for TcpCliDriver {
    fn platform(&self) -> &str {
        CLI_PLATFORM
    }

    async fn get_facts(&mut self) -> Result<Facts, DriverError> {
        Err(DriverError::NotSupported {
            platform: CLI_PLATFORM.to_string(),
            operation: "get_facts",
        })
    }

    async fn get_interfaces(&mut self) -> Result<Interfaces, DriverError> {
        Err(DriverError::NotSupported {
            platform: CLI_PLATFORM.to_string(),
            operation: "get_interfaces",
        })
    }

    async fn cli(&mut self, command: &str) -> Result<String, DriverError> {
        self.exec(command).await
    }

    async fn load_candidate(&mut self, config: &str, mode: LoadMode) -> Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::Closed);
        }
        self.candidate = Some((ConfigTree::parse(config), mode));
        Ok(())
    }

    async fn compare_config(&mut self) -> Result<String, DriverError> {
        Ok(self
            .target_config()
            .await?
            .map(|(running, target)| running.diff(&target))
            .unwrap_or_default())
    }

    async fn commit_config(&mut self) -> Result<(), DriverError> {
        let (running, target) = self.target_config().await?.ok_or(DriverError::NoCandidate)?;
        self.candidate = None;

        self.exec("configure terminal").await?;
        for line in change_commands(&running, &target) {
            let output = self.exec(&line).await?;
            if REJECT_MARKERS.iter().any(|marker| output.contains(marker)) {
                self.exec("end").await?;
                return Err(DriverError::ConfigRejected(format!("'{line}': {output}")));
            }
        }
        self.exec("end").await?;
        Ok(())
    }

    async fn discard_config(&mut self) -> Result<(), DriverError> {
        self.candidate = None;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.candidate = None;
        let _ = self.send("exit").await;
        let _ = self.stream.shutdown().await;
        Ok(())
    }
}

/// Reads until `done` accepts the text so far. Bytes are decoded as a whole,
/// a character split across reads stays intact.
async fn read_into<F>(stream: &mut TcpStream, done: &F) -> Result<String, DriverError>
where
    F: Fn(&str) -> bool,
{
    let mut bytes: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(DriverError::Closed);
        }
        bytes.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&bytes);
        if done(&text) {
            return Ok(text.into_owned());
        }
    }
}

fn last_line(buf: &str) -> &str {
    buf.rsplit(['\n', '\r']).next().unwrap_or("").trim_end()
}

fn is_prompt(buf: &str) -> bool {
    let line = last_line(buf);
    line.ends_with('#') || line.ends_with('>')
}

fn login_prompt(buf: &str) -> Option<LoginPrompt> {
    let line = last_line(buf).to_ascii_lowercase();
    if line.ends_with("username:") || line.ends_with("login:") {
        Some(LoginPrompt::Username)
    } else if line.ends_with("password:") {
        Some(LoginPrompt::Password)
    } else {
        None
    }
}

fn strip_echo_and_prompt(raw: &str, command: &str) -> String {
    let mut lines: Vec<&str> = raw.lines().collect();
    if lines.last().is_some_and(|line| is_prompt(line)) {
        lines.pop();
    }
    if lines.first().is_some_and(|line| line.trim() == command.trim()) {
        lines.remove(0);
    }
    lines.join("\n").trim_end().to_string()
}

fn parse_running(raw: &str) -> ConfigTree {
    let body: Vec<&str> = raw
        .lines()
        .filter(|line| {
            let line = line.trim_start_matches(['!', ' ']);
            !RUNNING_PREAMBLE.iter().any(|status| line.starts_with(status))
        })
        .collect();
    ConfigTree::parse(&body.join("\n"))
}

/// Configuration-mode commands turning `running` into `target`.
fn change_commands(running: &ConfigTree, target: &ConfigTree) -> Vec<String> {
    let mut commands = Vec::new();

    for wanted in target.sections() {
        match running.section(&wanted.header) {
            None => {
                commands.push(wanted.header.clone());
                commands.extend(wanted.children.iter().cloned());
                if !wanted.children.is_empty() {
                    commands.push("exit".to_string());
                }
            }
            Some(current) if current.children != wanted.children => {
                commands.push(wanted.header.clone());
                for gone in current.children.iter().filter(|c| !wanted.has_child(c)) {
                    commands.push(format!("no {gone}"));
                }
                for added in wanted.children.iter().filter(|c| !current.has_child(c)) {
                    commands.push(added.clone());
                }
                commands.push("exit".to_string());
            }
            Some(_) => {}
        }
    }

    for gone in running.sections() {
        if target.section(&gone.header).is_none() {
            commands.push(format!("no {}", gone.header));
        }
    }

    commands
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
