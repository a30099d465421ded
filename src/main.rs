fn main() {
    let args = std::env::args();

    if let Err(err) = master_backup::run(args) {
        // Failures before logging is up still need to reach the operator.
        if tracing::dispatcher::has_been_set() {
            tracing::error!("master-backup error: {err:#}");
        } else {
            eprintln!("master-backup error: {err:#}");
        }
        std::process::exit(1);
    }
}
