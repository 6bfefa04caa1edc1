mod commands;
mod terminal;

use commands::{CommandLine, Commands, fetch, ports, subdomains};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging();

    match commands.command {
        Commands::Ports {
            host,
            selection,
            banner,
        } => {
            print::header("port scan");
            ports::ports(host, selection, banner, &commands.scan).await
        }
        Commands::Subdomains { domain, wordlist } => {
            print::header("subdomain enumeration");
            subdomains::subdomains(domain, wordlist, &commands.scan).await
        }
        Commands::Fetch {
            host,
            template,
            names,
            json_content,
        } => {
            print::header("http fetch");
            fetch::fetch(host, template, names, json_content, &commands.scan).await
        }
    }
}
