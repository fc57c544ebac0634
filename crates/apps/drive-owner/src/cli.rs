use clap::builder::TypedValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use drive::{DeadLetterFailed, DropFailed, FailurePolicy, MAX_BATCH_SIZE, RetryFailed, TransferOptions};
use std::path::PathBuf;

/// What to do with a transfer that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnFailure {
    /// Log the failure and move on
    Drop,
    /// Queue the transfer again, up to --max-retries times
    Retry,
    /// Record the failure in --dead-letter-file
    DeadLetter,
}

#[derive(Debug, Parser)]
#[command(
    about = "Transfers ownership of all files and folders of a Google Drive folder, recursively.",
    version
)]
pub struct Args {
    /// E-mail address of the new owner.
    #[arg(short = 'o', long = "owner", value_name = "EMAIL")]
    pub owner: String,

    /// ID of the Google Drive folder. The user's root directory is used if left empty.
    #[arg(short = 'f', long = "folder", default_value = "root")]
    pub folder: String,

    /// Host name for the local authentication server.
    #[arg(short = 'H', long = "host", env = "OAUTH_HOST", default_value = "localhost")]
    pub host: String,

    /// Port number for the local authentication server. 0 picks a random port.
    #[arg(short = 'P', long = "port", env = "OAUTH_PORT", default_value_t = 65535)]
    pub port: u16,

    /// OAuth client secrets file (Google Cloud Console format).
    #[arg(long, value_name = "PATH")]
    pub credentials: Option<PathBuf>,

    /// Cached OAuth token file.
    #[arg(long, value_name = "PATH")]
    pub token_cache: Option<PathBuf>,

    /// Number of transfers submitted per batch request.
    #[arg(
        long,
        default_value_t = MAX_BATCH_SIZE,
        value_parser = clap::value_parser!(u16).range(1..=MAX_BATCH_SIZE as i64).map(usize::from)
    )]
    pub batch_size: usize,

    /// Handling of failed transfers.
    #[arg(long, value_enum, default_value_t = OnFailure::Drop)]
    pub on_failure: OnFailure,

    /// Retries per transfer with --on-failure retry.
    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,

    /// With --on-failure retry, only retry rate limits and server errors.
    #[arg(long)]
    pub retry_transient_only: bool,

    /// With --on-failure retry, dead-letter transfers that are not retried again.
    #[arg(long)]
    pub dead_letter_exhausted: bool,

    /// Where dead-lettered transfers are written as JSON.
    #[arg(long, value_name = "PATH", default_value = "dead-letter.json")]
    pub dead_letter_file: PathBuf,

    /// Reset the backoff delay after every successful transfer.
    #[arg(long)]
    pub reset_backoff: bool,

    /// Maximum folder nesting depth.
    #[arg(long, default_value_t = TransferOptions::DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Enable verbose output. Use once (-v) for DEBUG and twice (-vv) for TRACE.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            2.. => "trace",
            1 => "debug",
            _ => "info",
        }
    }

    pub fn transfer_options(&self) -> TransferOptions {
        TransferOptions::new(&self.owner)
            .folder(self.folder.as_str().into())
            .batch_size(self.batch_size)
            .max_depth(self.max_depth)
    }

    pub fn failure_policy(&self) -> Box<dyn FailurePolicy> {
        match self.on_failure {
            OnFailure::Drop => Box::new(DropFailed),
            OnFailure::Retry => {
                let mut policy = RetryFailed::new(self.max_retries);
                if self.retry_transient_only {
                    policy = policy.transient_only();
                }
                if self.dead_letter_exhausted {
                    policy = policy.then_dead_letter();
                }
                Box::new(policy)
            }
            OnFailure::DeadLetter => Box::new(DeadLetterFailed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drive::{FailureAction, FileId, ItemError, TransferRequest};

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["drive-owner", "-o", "a@b.c"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn request(attempts: u32) -> TransferRequest {
        TransferRequest {
            attempts,
            ..TransferRequest::new(FileId::new("f1"), "doc", "a@b.c")
        }
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["drive-owner", "-o", "new@example.com"]).unwrap();
        assert_eq!(args.owner, "new@example.com");
        assert_eq!(args.folder, "root");
        assert_eq!(args.batch_size, 100);
        assert_eq!(args.on_failure, OnFailure::Drop);
        assert_eq!(args.log_filter(), "info");

        let options = args.transfer_options();
        assert_eq!(options.folder.as_str(), "root");
        assert_eq!(options.new_owner, "new@example.com");
    }

    #[test]
    fn test_owner_is_required() {
        assert!(Args::try_parse_from(["drive-owner"]).is_err());
    }

    #[test]
    fn test_short_flags() {
        let args = Args::try_parse_from([
            "drive-owner", "-o", "a@b.c", "-f", "folder-1", "-H", "127.0.0.1", "-P", "0", "-vv",
        ])
        .unwrap();
        assert_eq!(args.folder, "folder-1");
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 0);
        assert_eq!(args.log_filter(), "trace");
    }

    #[test]
    fn test_batch_size_bounds() {
        assert!(Args::try_parse_from(["drive-owner", "-o", "a@b.c", "--batch-size", "101"]).is_err());
        assert!(Args::try_parse_from(["drive-owner", "-o", "a@b.c", "--batch-size", "0"]).is_err());
        let args = Args::try_parse_from(["drive-owner", "-o", "a@b.c", "--batch-size", "25"]).unwrap();
        assert_eq!(args.batch_size, 25);
    }

    #[test]
    fn test_on_failure_values() {
        let args = Args::try_parse_from(["drive-owner", "-o", "a@b.c", "--on-failure", "dead-letter"])
            .unwrap();
        assert_eq!(args.on_failure, OnFailure::DeadLetter);
    }

    #[test]
    fn test_retry_policy_defaults() {
        let mut policy = parse(&["--on-failure", "retry", "--max-retries", "1"]).failure_policy();
        let forbidden = ItemError::new(403, Some("forbidden".into()), "nope");

        assert_eq!(policy.on_failure(&request(0), &forbidden), FailureAction::Retry);
        assert_eq!(policy.on_failure(&request(1), &forbidden), FailureAction::Drop);
    }

    #[test]
    fn test_retry_transient_only_flag() {
        let mut policy = parse(&["--on-failure", "retry", "--retry-transient-only"]).failure_policy();
        let forbidden = ItemError::new(403, Some("forbidden".into()), "nope");
        let unavailable = ItemError::new(503, None, "Service Unavailable");

        assert_eq!(policy.on_failure(&request(0), &forbidden), FailureAction::Drop);
        assert_eq!(policy.on_failure(&request(0), &unavailable), FailureAction::Retry);
    }

    #[test]
    fn test_dead_letter_exhausted_flag() {
        let mut policy = parse(&[
            "--on-failure",
            "retry",
            "--max-retries",
            "2",
            "--retry-transient-only",
            "--dead-letter-exhausted",
        ])
        .failure_policy();
        let unavailable = ItemError::new(503, None, "Service Unavailable");
        let not_found = ItemError::new(404, Some("notFound".into()), "gone");

        assert_eq!(policy.on_failure(&request(1), &unavailable), FailureAction::Retry);
        assert_eq!(policy.on_failure(&request(2), &unavailable), FailureAction::DeadLetter);
        assert_eq!(policy.on_failure(&request(0), &not_found), FailureAction::DeadLetter);
    }
}
