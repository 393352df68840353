use log::debug;

/// Pick the repository switches (`--enablerepo=...`, `--disablerepo=...`)
/// out of free-form yum options. Returns `None` when there are none.
pub fn repo_control_args(options: &str) -> Option<String> {
    let selected: Vec<&str> = options
        .split_whitespace()
        .filter(|opt| {
            let keep = ["--enablerepo=", "--disablerepo="]
                .iter()
                .any(|prefix| opt.strip_prefix(prefix).is_some_and(|repo| !repo.is_empty()));
            if !keep {
                debug!("Ignoring option {} for metadata refresh", opt);
            }
            keep
        })
        .collect();

    (!selected.is_empty()).then(|| selected.join(" "))
}
