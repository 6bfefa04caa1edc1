use super::{Fallback, ScanArgs, run};
use probekit::{ContentCheck, HttpFetchProbe, Scanner, TargetSet};

pub async fn fetch(
    host: String,
    template: String,
    names: Vec<String>,
    json_content: bool,
    args: &ScanArgs,
) -> anyhow::Result<()> {
    let check = if json_content {
        ContentCheck::Json
    } else {
        ContentCheck::NonEmpty
    };
    let probe = HttpFetchProbe::new(template)?.with_check(check);

    let config = args.configure(&host, TargetSet::names(names)?, Fallback::default())?;

    run::execute(Scanner::new(probe).without_classifier(), config, args.json).await
}
