//! Digital signature boundary
//!
//! The engine never signs by itself: it hands the unsigned XML to a
//! [`SignatureGateway`] and stores whatever comes back.

use crate::config::SignerConfig;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Failure of the signer
#[derive(Debug, Clone, Error)]
pub enum SignatureError {
    /// No signer is configured or it cannot be started
    #[error("Signer unavailable: {0}")]
    Unavailable(String),

    /// The signer ran and refused the document
    #[error("Signer rejected the document: {0}")]
    Rejected(String),

    /// The signer did not answer in time
    #[error("Signer timed out after {0}s")]
    Timeout(u64),
}

impl From<SignatureError> for crate::domain::EdiError {
    fn from(err: SignatureError) -> Self {
        crate::domain::EdiError::Signature(err.to_string())
    }
}

#[async_trait]
pub trait SignatureGateway: Send + Sync {
    /// Returns the signed document
    async fn sign(&self, xml: &str) -> Result<String, SignatureError>;
}

/// Runs an external program: unsigned XML on stdin, signed XML on stdout
#[derive(Debug, Clone)]
pub struct CommandSigner {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandSigner {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// `None` when no command is configured
    pub fn from_config(config: &SignerConfig) -> Option<Self> {
        config.command.as_ref().map(|command| {
            Self::new(
                command.clone(),
                config.args.clone(),
                Duration::from_secs(config.timeout_seconds),
            )
        })
    }

    async fn run(&self, xml: &str) -> Result<String, SignatureError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SignatureError::Unavailable(format!("{}: {}", self.program, e)))?;

        // Feed stdin concurrently so a large document cannot fill both pipes
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SignatureError::Unavailable("signer stdin closed".to_string()))?;
        let input = xml.as_bytes().to_vec();
        let writer = tokio::spawn(async move { stdin.write_all(&input).await });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| SignatureError::Unavailable(e.to_string()))?;

        match writer.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => {
                return Err(SignatureError::Unavailable(format!("writing to signer: {e}")))
            }
            Err(e) => return Err(SignatureError::Unavailable(e.to_string())),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(SignatureError::Rejected(format!(
                "exit status {}: {}",
                output.status, stderr
            )));
        }

        let signed = String::from_utf8(output.stdout)
            .map_err(|e| SignatureError::Rejected(format!("output is not UTF-8: {e}")))?;
        if signed.trim().is_empty() {
            return Err(SignatureError::Rejected("empty output".to_string()));
        }
        Ok(signed)
    }
}

#[async_trait]
impl SignatureGateway for CommandSigner {
    async fn sign(&self, xml: &str) -> Result<String, SignatureError> {
        tokio::time::timeout(self.timeout, self.run(xml))
            .await
            .map_err(|_| SignatureError::Timeout(self.timeout.as_secs()))?
    }
}

/// Signer used when none is configured; every call fails
#[derive(Debug, Clone, Default)]
pub struct MissingSigner;

#[async_trait]
impl SignatureGateway for MissingSigner {
    async fn sign(&self, _xml: &str) -> Result<String, SignatureError> {
        Err(SignatureError::Unavailable(
            "no signer configured (signer.command)".to_string(),
        ))
    }
}
