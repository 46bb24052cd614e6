use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::PilotConfig;
use crate::worker::Credentials;

/// Fully resolved worker invocation: program, arguments, and its log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerInvocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub log_path: PathBuf,
}

impl WorkerInvocation {
    /// Render as a single shell-like line for logs.
    pub fn display_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// `plots create` template: everything except the temp workspace, the
/// destination, and the log file, which vary per launch.
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    program: PathBuf,
    num_plots: String,
    k_size: String,
    buffer: String,
    threads: String,
    buckets: Option<String>,
    farmer_key: String,
    pool_key: String,
    pool_contract: bool,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>, config: &PilotConfig, credentials: &Credentials) -> Self {
        Self {
            program: program.into(),
            num_plots: config.num_plots.trim().to_string(),
            k_size: config.k_size.trim().to_string(),
            buffer: config.buffer.trim().to_string(),
            threads: config.threads.trim().to_string(),
            buckets: Some(config.buckets.trim().to_string()).filter(|b| !b.is_empty()),
            farmer_key: credentials.farmer_key.clone(),
            pool_key: credentials.pool_key.clone(),
            pool_contract: config.pool,
        }
    }

    pub fn build(&self, temp_dir: &Path, destination: &Path, log_path: PathBuf) -> WorkerInvocation {
        let mut args: Vec<OsString> = Vec::with_capacity(22);
        let mut push = |flag: &str, value: &str| {
            args.push(flag.into());
            args.push(value.into());
        };

        push("-n", &self.num_plots);
        push("-k", &self.k_size);
        push("-b", &self.buffer);
        push("-r", &self.threads);
        if let Some(buckets) = &self.buckets {
            push("-u", buckets);
        }
        push("-f", &self.farmer_key);
        push(if self.pool_contract { "-c" } else { "-p" }, &self.pool_key);

        let mut full: Vec<OsString> = vec!["plots".into(), "create".into()];
        full.extend(args);
        full.push("-t".into());
        full.push(temp_dir.as_os_str().to_os_string());
        full.push("-d".into());
        full.push(destination.as_os_str().to_os_string());

        WorkerInvocation {
            program: self.program.clone(),
            args: full,
            log_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            farmer_key: "farmer".into(),
            pool_key: "pool".into(),
        }
    }

    fn args_of(inv: &WorkerInvocation) -> Vec<String> {
        inv.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_build_plots_create() {
        let config = PilotConfig {
            num_plots: "2".into(),
            k_size: "32".into(),
            buffer: "4000".into(),
            threads: "4".into(),
            ..Default::default()
        };
        let cmd = WorkerCommand::new("/opt/chia/chia", &config, &credentials());
        let inv = cmd.build(Path::new("/tmp/a"), Path::new("/mnt/d1"), "/log/x.log".into());

        assert_eq!(inv.program, PathBuf::from("/opt/chia/chia"));
        assert_eq!(
            args_of(&inv),
            vec![
                "plots", "create", "-n", "2", "-k", "32", "-b", "4000", "-r", "4", "-f",
                "farmer", "-p", "pool", "-t", "/tmp/a", "-d", "/mnt/d1",
            ]
        );
        assert_eq!(inv.log_path, PathBuf::from("/log/x.log"));
    }

    #[test]
    fn test_pool_contract_and_buckets() {
        let config = PilotConfig {
            pool: true,
            buckets: "128".into(),
            ..Default::default()
        };
        let cmd = WorkerCommand::new("chia", &config, &credentials());
        let args = args_of(&cmd.build(Path::new("t"), Path::new("d"), "l".into()));

        let c = args.iter().position(|a| a == "-c").unwrap();
        assert_eq!(args[c + 1], "pool");
        assert!(!args.contains(&"-p".to_string()));
        let u = args.iter().position(|a| a == "-u").unwrap();
        assert_eq!(args[u + 1], "128");
    }

    #[test]
    fn test_display_line() {
        let cmd = WorkerCommand::new("chia", &PilotConfig::default(), &credentials());
        let line = cmd
            .build(Path::new("t"), Path::new("d"), "l".into())
            .display_line();
        assert!(line.starts_with("chia plots create -n 1 -k 32"));
        assert!(line.ends_with("-t t -d d"));
    }
}
