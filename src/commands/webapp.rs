use anyhow::Result;
use runcloud_api::Lookup;

use crate::Context;
use crate::cli::WebappArgs;
use crate::resource::WebApplication;
use crate::resource::web_application::{FpmSettings, PhpSettings, SecurityHeaders};

pub fn build(args: &WebappArgs) -> runcloud_api::Result<WebApplication> {
    let mut webapp = WebApplication::new(
        args.server.lookup(),
        Lookup::new(args.user_id, args.user_name.clone()),
        &args.name,
        &args.domain_name,
        args.php_version.parse()?,
    );
    webapp.public_path.clone_from(&args.public_path);
    webapp.stack = args.stack.parse()?;
    webapp.stack_mode = args.stack_mode.parse()?;
    webapp.headers = SecurityHeaders {
        clickjacking_protection: args.clickjacking_protection,
        xss_protection: args.xss_protection,
        mime_sniffing_protection: args.mime_sniffing_protection,
    };
    webapp.fpm = FpmSettings {
        process_manager: args.process_manager.parse()?,
        start_servers: args.process_manager_start_servers,
        min_spare_servers: args.process_manager_min_spare_servers,
        max_spare_servers: args.process_manager_max_spare_servers,
        max_children: args.process_manager_max_children,
        max_requests: args.process_manager_max_requests,
    };

    let defaults = PhpSettings::default();
    webapp.php = PhpSettings {
        open_basedir: args.open_basedir.clone(),
        timezone: args.timezone.clone(),
        disable_functions: args
            .disable_functions
            .clone()
            .unwrap_or(defaults.disable_functions),
        max_execution_time: args.max_execution_time,
        max_input_time: args.max_input_time,
        max_input_vars: args.max_input_vars,
        memory_limit: args.memory_limit,
        post_max_size: args.post_max_size,
        upload_max_filesize: args.upload_max_filesize,
        session_gc_maxlifetime: args.session_gc_maxlifetime,
        allow_url_fopen: args.allow_url_fopen,
    };
    Ok(webapp)
}

pub fn run(ctx: &Context, args: WebappArgs) -> Result<()> {
    let webapp = build(&args)?;
    super::reconcile(ctx, &webapp, args.state.state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use crate::resource::web_application::{ProcessManager, Stack};
    use clap::Parser;

    fn args(extra: &[&str]) -> WebappArgs {
        let mut argv = vec![
            "rcctl", "webapp", "--server-name", "web-1", "--name", "shop", "--domain-name",
            "shop.example.com", "--user-name", "alice", "--php-version", "8.1",
        ];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Webapp(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_build_webapp() {
        let webapp = build(&args(&["--stack", "nativenginx", "--process-manager", "ondemand"]))
            .unwrap();
        assert_eq!(webapp.stack, Stack::NativeNginx);
        assert_eq!(webapp.fpm.process_manager, ProcessManager::OnDemand);
        assert_eq!(webapp.owner, Lookup::by_name("alice"));
        assert!(webapp.php.disable_functions.starts_with("getmyuid,"));
        assert_eq!(webapp.php.open_basedir, None);
    }

    #[test]
    fn test_bad_stack_mode_rejected() {
        let err = build(&args(&["--stack-mode", "staging"])).unwrap_err();
        assert!(matches!(
            err,
            runcloud_api::Error::Validation { field: "stack_mode", .. }
        ));
    }
}
