use anyhow::Result;

use crate::Context;
use crate::cli::AccountArgs;
use crate::resource::{DatabaseUser, SystemUser};

pub fn run_database_user(ctx: &Context, args: AccountArgs) -> Result<()> {
    let user = DatabaseUser::new(args.server.lookup(), &args.username, args.password);
    super::reconcile(ctx, &user, args.state.state)
}

pub fn run_system_user(ctx: &Context, args: AccountArgs) -> Result<()> {
    let user = SystemUser::new(args.server.lookup(), &args.username, args.password);
    super::reconcile(ctx, &user, args.state.state)
}
