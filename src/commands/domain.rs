use anyhow::Result;

use crate::Context;
use crate::cli::DomainArgs;
use crate::resource::Domain;

pub fn build(args: &DomainArgs) -> runcloud_api::Result<Domain> {
    let mut domain = Domain::new(args.server.lookup(), args.webapp.lookup(), &args.name);
    domain.www = args.www;
    domain.redirection = args.redirection.parse()?;
    domain.domain_type = args.domain_type.parse()?;
    Ok(domain)
}

pub fn run(ctx: &Context, args: DomainArgs) -> Result<()> {
    let domain = build(&args)?;
    super::reconcile(ctx, &domain, args.state.state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use crate::resource::domain::{DomainType, Redirection};
    use clap::Parser;
    use runcloud_api::Lookup;

    fn args(extra: &[&str]) -> DomainArgs {
        let mut argv = vec![
            "rcctl", "domain", "--server-id", "1", "--webapp-name", "shop", "--name",
            "shop.example.com",
        ];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Domain(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_build_domain() {
        let domain = build(&args(&["--redirection", "non-www", "--type", "primary"])).unwrap();
        assert_eq!(domain.server, Lookup::by_id(1));
        assert_eq!(domain.redirection, Redirection::NonWww);
        assert_eq!(domain.domain_type, DomainType::Primary);
    }

    #[test]
    fn test_bad_redirection_rejected() {
        assert!(build(&args(&["--redirection", "https"])).is_err());
    }
}
