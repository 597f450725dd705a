//! 转写客户端
//!
//! 通过外部脚本获取视频转写；脚本以 `ERROR:` 开头的输出表示应用层错误

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::clients::traits::ContextSupplier;
use crate::config::Config;
use crate::error::{ClientError, ClientResult};

pub struct CommandTranscriptSupplier {
    program: String,
    args: Vec<String>,
}

impl CommandTranscriptSupplier {
    pub fn new(config: &Config) -> Self {
        Self::with_command(
            config.transcript_program.clone(),
            vec![config.transcript_script.clone()],
        )
    }

    /// 自定义命令；content id 作为最后一个参数追加
    pub fn with_command(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl ContextSupplier for CommandTranscriptSupplier {
    async fn get_context(&self, content_id: &str) -> ClientResult<String> {
        debug!("执行转写命令: {} {:?} {}", self.program, self.args, content_id);

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(content_id)
            .kill_on_drop(true)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClientError::Other(format!(
                "转写命令执行失败 ({}): {} {}",
                output.status,
                stdout.trim(),
                stderr.trim()
            )));
        }

        interpret_output(&stdout)
    }
}

fn interpret_output(stdout: &str) -> ClientResult<String> {
    let transcript = stdout.trim();
    if let Some(message) = transcript.strip_prefix("ERROR:") {
        return Err(ClientError::Other(message.trim().to_string()));
    }
    if transcript.is_empty() {
        return Err(ClientError::EmptyResponse("转写为空".to_string()));
    }
    Ok(transcript.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_prefix_becomes_error() {
        let err = interpret_output("ERROR: Transcripts are disabled\n").unwrap_err();
        assert_eq!(err.to_string(), "Transcripts are disabled");
    }

    #[test]
    fn test_blank_output_is_empty_response() {
        assert!(matches!(interpret_output("  \n"), Err(ClientError::EmptyResponse(_))));
    }

    #[test]
    fn test_transcript_is_trimmed() {
        assert_eq!(interpret_output("  bonjour à tous\n").unwrap(), "bonjour à tous");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_command_with_content_id() {
        let supplier =
            CommandTranscriptSupplier::with_command("echo", vec!["transcript for".to_string()]);
        let context = supplier.get_context("abc123").await.unwrap();
        assert_eq!(context, "transcript for abc123");
    }

    #[tokio::test]
    async fn test_missing_program_is_io_error() {
        let supplier =
            CommandTranscriptSupplier::with_command("definitely-not-a-real-binary-xyz", vec![]);
        assert!(matches!(supplier.get_context("abc").await, Err(ClientError::Io(_))));
    }
}
