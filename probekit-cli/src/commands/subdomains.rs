use super::{Fallback, ScanArgs, run};
use anyhow::Context;
use probekit::{DnsResolveProbe, Scanner, TargetSet};
use std::path::PathBuf;
use tracing::warn;

pub async fn subdomains(domain: String, wordlist: Option<PathBuf>, args: &ScanArgs) -> anyhow::Result<()> {
    let targets = match wordlist {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading wordlist {}", path.display()))?;
            TargetSet::subdomains(&domain, read_labels(&content))?
        }
        None => TargetSet::default_subdomains(&domain)?,
    };

    let config = args.configure(&domain, targets, Fallback::default())?;

    let probe = DnsResolveProbe::system(config.probe_timeout()).unwrap_or_else(|e| {
        warn!(error = %e, "falling back to the default public resolvers");
        DnsResolveProbe::new(config.probe_timeout())
    });

    run::execute(Scanner::new(probe).without_classifier(), config, args.json).await
}

fn read_labels(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdomains_read_labels_skips_comments() {
        let labels: Vec<&str> = read_labels("www\n# common\n\napi # rest\n  mail  \n").collect();
        assert_eq!(labels, vec!["www", "api", "mail"]);
    }
}
