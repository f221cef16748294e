//! The `user@host:[path]$ ` prompt.

use crate::env::{Environment, effective_user};
use colored::Colorize;
use nix::unistd::gethostname;
use std::env;
use std::path::Path;

/// Builds the prompt for the next line from the current user, host and
/// working directory.
pub fn render(env: &Environment) -> String {
    let user = effective_user()
        .map(|user| user.name)
        .unwrap_or_else(|| "?".to_string());
    let host = match gethostname() {
        Ok(host) => host.to_string_lossy().into_owned(),
        Err(e) => {
            log::warn!("gethostname failed: {e}");
            "?".to_string()
        }
    };
    let path = match env::current_dir() {
        Ok(cwd) => match &env.home {
            Some(home) => abbreviate_home(&cwd, home),
            None => cwd.display().to_string(),
        },
        Err(e) => {
            log::warn!("cannot read the working directory: {e}");
            "?".to_string()
        }
    };
    format_prompt(&user, &host, &path)
}

fn format_prompt(user: &str, host: &str, path: &str) -> String {
    format!(
        "{}{}:[{}]$ ",
        user.bright_green().bold(),
        format!("@{host}").bright_red().bold(),
        path
    )
}

/// Shows `cwd` relative to `home` as `~` or `~/...`. Only whole path
/// components match, so `/home/user2` is not shortened for `/home/user`.
pub fn abbreviate_home(cwd: &Path, home: &Path) -> String {
    match cwd.strip_prefix(home) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{}", rest.display()),
        Err(_) => cwd.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_itself_is_tilde() {
        assert_eq!(abbreviate_home(Path::new("/home/u"), Path::new("/home/u")), "~");
    }

    #[test]
    fn below_home_is_relative_to_tilde() {
        assert_eq!(
            abbreviate_home(Path::new("/home/u/src/vsh"), Path::new("/home/u")),
            "~/src/vsh"
        );
    }

    #[test]
    fn outside_home_is_absolute() {
        assert_eq!(abbreviate_home(Path::new("/tmp"), Path::new("/home/u")), "/tmp");
        assert_eq!(
            abbreviate_home(Path::new("/home/u2/x"), Path::new("/home/u")),
            "/home/u2/x"
        );
    }

    #[test]
    fn prompt_layout() {
        colored::control::set_override(false);
        assert_eq!(format_prompt("alice", "box", "~/src"), "alice@box:[~/src]$ ");
        colored::control::unset_override();
    }
}
