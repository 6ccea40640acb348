// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)

use std::fs;
use std::path::Path;

use clap::CommandFactory;

include!("src/cli.rs");

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    // Write to the source tree so the pages are available for git commits.
    // Silently skip if the filesystem is read-only (e.g. container linters).
    let man_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("man");
    if fs::create_dir_all(&man_dir).is_err() {
        return;
    }

    let cmd = Cli::command();
    render_page(&man_dir, "duckman", cmd.clone());

    // One page per visible subcommand, e.g. duckman-install(1)
    for sub in cmd.get_subcommands().filter(|sub| !sub.is_hide_set()) {
        let page = format!("duckman-{}", sub.get_name());
        render_page(&man_dir, &page, sub.clone().display_name(page.clone()));
    }
}

fn render_page(man_dir: &Path, page: &str, cmd: clap::Command) {
    let mut buffer: Vec<u8> = Vec::new();
    clap_mangen::Man::new(cmd)
        .render(&mut buffer)
        .expect("failed to render man page");
    let _ = fs::write(man_dir.join(format!("{page}.1")), buffer);
}
