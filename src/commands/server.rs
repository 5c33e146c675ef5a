use anyhow::Result;

use crate::Context;
use crate::cli::ServerArgs;
use crate::resource::Server;
use crate::resource::server::{AutoUpdate, SshSettings};
use crate::runner::ShellRunner;

pub fn build(args: &ServerArgs) -> runcloud_api::Result<Server> {
    let mut server = Server::new(&args.name, &args.ip_address, args.php_version.parse()?);
    server.provider.clone_from(&args.provider);
    server.ssh = SshSettings {
        passwordless_login: args.passwordless_login,
        use_dns: args.use_dns,
        prevent_root_login: args.prevent_root_login,
    };
    server.auto_update = AutoUpdate {
        software_update: args.software_update,
        security_update: args.security_update,
    };
    server.install_script = args.install_script;
    Ok(server)
}

pub fn run(ctx: &Context, args: ServerArgs) -> Result<()> {
    let server = build(&args)?;
    let runner = ShellRunner::new(args.sudo);
    super::reconcile_with(ctx, &server, args.state.state, &runner)
}
