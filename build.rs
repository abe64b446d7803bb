// SPDX-License-Identifier: MPL-2.0

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=CAMERA_MIRROR_VERSION");

    // Packagers may pin the version explicitly
    let version = std::env::var("CAMERA_MIRROR_VERSION").unwrap_or_else(|_| git_version());

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// Version from `git describe`
///
/// `v0.3.0` becomes `0.3.0-<hash>`, `v0.3.0-4-g1a2b3c4` becomes
/// `0.3.0-dirty-1a2b3c4`. Outside a git checkout this is `unknown`.
fn git_version() -> String {
    let describe = git(&["describe", "--tags", "--always", "--match", "v*"]);
    let hash = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".to_string());

    let Some(describe) = describe else {
        return hash;
    };
    let describe = describe.strip_prefix('v').unwrap_or(&describe);

    let parts: Vec<&str> = describe.rsplitn(3, '-').collect();
    match parts.as_slice() {
        [commit, _ahead, base] => {
            let commit = commit.strip_prefix('g').unwrap_or(commit);
            format!("{}-dirty-{}", base, commit)
        }
        _ if describe == hash => hash,
        _ => format!("{}-{}", describe, hash),
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}
