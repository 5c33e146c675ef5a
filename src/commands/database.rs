use anyhow::Result;

use crate::Context;
use crate::cli::DatabaseArgs;
use crate::resource::Database;

pub fn build(args: &DatabaseArgs) -> Database {
    let mut database = Database::new(args.server.lookup(), &args.name);
    database.collation.clone_from(&args.collation);
    if args.revoke_all || !args.users.is_empty() {
        database = database.with_users(args.users.clone());
    }
    database
}

pub fn run(ctx: &Context, args: DatabaseArgs) -> Result<()> {
    let database = build(&args);
    super::reconcile(ctx, &database, args.state.state)
}
