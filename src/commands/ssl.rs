use anyhow::Result;

use crate::Context;
use crate::cli::SslArgs;
use crate::resource::Ssl;

pub fn build(args: &SslArgs) -> runcloud_api::Result<Ssl> {
    let mut ssl = Ssl::new(args.server.lookup(), args.webapp.lookup());
    ssl.advanced = args.advanced;
    ssl.auto = args.auto;
    ssl.provider = args.provider.parse()?;
    ssl.enable_http = args.enable_http;
    ssl.enable_hsts = args.enable_hsts;
    ssl.protocol = args.protocol.parse()?;
    ssl.authorization_method = args.authorization_method.parse()?;
    ssl.environment = args.environment.parse()?;
    Ok(ssl)
}

pub fn run(ctx: &Context, args: SslArgs) -> Result<()> {
    let ssl = build(&args)?;
    super::reconcile(ctx, &ssl, args.state.state)
}
