fn main() {
    if handle_cli_flags() {
        return;
    }

    if let Err(err) = timeline_river::run() {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn handle_cli_flags() -> bool {
    let mut saw_flag = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("timeline-river {}", timeline_river::VERSION);
                saw_flag = true;
            }
            "--help" | "-h" => {
                println!(
                    "timeline-river: lay out a post river as text.\n\n  feed <posts.json>                      Per-author feed, newest author first\n  timeline <posts.json> [--user <name>]  Three-column timeline for one subject\n  thread <posts.json> <post-id> [--all]  Replies for one post\n  --config <path>                        Config file to load\n  --version, -V                          Show version and exit\n  --help,    -h                          Show this help message"
                );
                saw_flag = true;
            }
            _ => {}
        }
    }
    saw_flag
}
