//! Static, rule-based risk classification.
//!
//! A command line is cut into simple commands at `;`, `&&`, `||`, `|`, `&`
//! and newlines (quotes respected). Command substitutions are classified as
//! commands of their own. Each simple command is judged by its program name
//! and arguments, then by its redirections; the highest tier wins.
//!
//! The rules err toward the stricter tier when a command is ambiguous.

use super::RiskTier;
use once_cell::sync::Lazy;
use regex::Regex;

/// Result of classifying one command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub tier: RiskTier,
    /// Short description of the rule that set the tier
    pub reason: Option<&'static str>,
}

impl Assessment {
    fn safe() -> Self {
        Self {
            tier: RiskTier::Safe,
            reason: None,
        }
    }

    fn of(tier: RiskTier, reason: &'static str) -> Self {
        Self {
            tier,
            reason: Some(reason),
        }
    }

    /// Keep whichever assessment is stricter; ties keep `self`
    fn merge(self, other: Assessment) -> Self {
        if other.tier > self.tier { other } else { self }
    }
}

#[allow(clippy::unwrap_used)]
static FORK_BOMB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":\s*\(\s*\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:").unwrap());

#[allow(clippy::unwrap_used)]
static PIPE_TO_SHELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(curl|wget|iwr|invoke-webrequest)\b[^|]*\|\s*(sudo\s+)?(sh|bash|zsh|ksh|dash|fish|iex|invoke-expression|python3?|perl)\b",
    )
    .unwrap()
});

#[allow(clippy::unwrap_used)]
static REDIRECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:&>>?|\d*>>?)\s*(&?[^\s|;&<>]+)").unwrap());

#[allow(clippy::unwrap_used)]
static SUBSTITUTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\(([^()]*)\)|`([^`]*)`").unwrap());

const BLOCK_DEVICE_PREFIXES: &[&str] = &[
    "/dev/sd",
    "/dev/hd",
    "/dev/vd",
    "/dev/xvd",
    "/dev/nvme",
    "/dev/mmcblk",
    "/dev/disk",
    "/dev/rdisk",
];

const HARMLESS_REDIRECT_TARGETS: &[&str] = &["/dev/null", "/dev/stdout", "/dev/stderr", "/dev/tty"];

/// Deletion targets that wipe far more than a file or two
const SWEEPING_TARGETS: &[&str] = &[
    "/", "/*", "~", "~/", "~/*", "$HOME", "$HOME/", "$HOME/*", "${HOME}", "*", ".*", ".", "..",
];

const PRIVILEGE_ESCALATION: &[&str] = &["sudo", "su", "doas", "pkexec", "runas", "gsudo"];

const DISK_TOOLS: &[&str] = &[
    "dd",
    "fdisk",
    "sfdisk",
    "cfdisk",
    "gdisk",
    "parted",
    "wipefs",
    "shred",
    "mkswap",
    "diskpart",
    "format",
    "format-volume",
    "clear-disk",
    "diskutil",
];

const POWER_COMMANDS: &[&str] = &["shutdown", "reboot", "halt", "poweroff", "stop-computer", "restart-computer"];

/// Programs that change files or process state whatever their arguments
const MUTATING_PROGRAMS: &[&str] = &[
    "mv",
    "cp",
    "mkdir",
    "touch",
    "ln",
    "tee",
    "truncate",
    "install",
    "rsync",
    "scp",
    "patch",
    "unzip",
    "gunzip",
    "bunzip2",
    "unxz",
    "kill",
    "pkill",
    "killall",
    "taskkill",
    "stop-process",
    "useradd",
    "userdel",
    "usermod",
    "groupadd",
    "passwd",
    "mount",
    "umount",
    "swapoff",
    "iptables",
    "ufw",
    "chattr",
    "setx",
    "new-item",
    "set-content",
    "copy-item",
    "move-item",
    "rename-item",
    "eval",
    "source",
    ".",
];

const PACKAGE_MANAGERS: &[&str] = &[
    "apt", "apt-get", "aptitude", "dpkg", "yum", "dnf", "rpm", "zypper", "pacman", "yay", "apk",
    "brew", "port", "snap", "flatpak", "choco", "winget", "scoop", "nix-env",
];

const LANGUAGE_PACKAGE_MANAGERS: &[&str] = &[
    "pip", "pip3", "pipx", "npm", "yarn", "pnpm", "bun", "gem", "cargo", "go", "composer",
    "conda", "mamba", "uv", "poetry",
];

/// Package-manager subcommands that only read state
const PACKAGE_QUERIES: &[&str] = &[
    "search", "list", "show", "info", "policy", "outdated", "doctor", "view", "why", "ls",
    "--version", "-v", "-V", "--help", "-h", "help", "version", "check", "freeze", "tree",
    "build", "test", "run", "fmt", "clippy", "doc", "vet", "env", "config",
];

const LANGUAGE_PACKAGE_WRITES: &[&str] = &[
    "install", "i", "ci", "add", "uninstall", "remove", "rm", "un", "update", "upgrade", "up",
    "publish", "link", "get", "sync", "global",
];

const GIT_WRITES: &[&str] = &[
    "commit", "push", "reset", "checkout", "switch", "merge", "rebase", "clean", "restore",
    "rm", "mv", "stash", "cherry-pick", "revert", "pull", "am", "apply", "tag", "branch",
    "add", "init", "clone", "fetch", "gc", "prune", "filter-branch",
];

const SERVICE_QUERIES: &[&str] = &[
    "status", "list-units", "list-unit-files", "is-active", "is-enabled", "show", "cat", "list",
    "--status-all",
];

const CONTAINER_QUERIES: &[&str] = &[
    "ps", "images", "logs", "inspect", "get", "describe", "top", "version", "info", "stats",
    "explain", "api-resources", "config", "list", "ls",
];

/// Programs that run the command given in their arguments
const WRAPPERS: &[&str] = &[
    "env", "nohup", "time", "nice", "ionice", "exec", "command", "builtin", "stdbuf", "caffeinate",
    "timeout", "watch",
];

/// Options that consume the next token, per program that runs another command
const VALUE_OPTIONS: &[(&str, &[&str])] = &[
    ("env", &["-u", "--unset", "-C", "--chdir", "-S", "--split-string"]),
    ("nice", &["-n", "--adjustment"]),
    ("ionice", &["-c", "--class", "-n", "--classdata", "-p", "--pid", "-P", "--pgid", "-u", "--uid"]),
    ("timeout", &["-s", "--signal", "-k", "--kill-after"]),
    ("watch", &["-n", "--interval", "-q", "--equexit"]),
    ("time", &["-f", "--format", "-o", "--output"]),
    ("exec", &["-a"]),
    ("stdbuf", &["-i", "--input", "-o", "--output", "-e", "--error"]),
    ("caffeinate", &["-t", "-w"]),
    (
        "xargs",
        &[
            "-n", "--max-args", "-I", "-L", "--max-lines", "-P", "--max-procs", "-d", "--delimiter",
            "-E", "-s", "--max-chars", "-a", "--arg-file",
        ],
    ),
];

/// Rule-based classifier over the shapes of common shell commands
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskClassifier;

impl RiskClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a full command line
    pub fn classify(&self, command: &str) -> Assessment {
        if FORK_BOMB.is_match(command) {
            return Assessment::of(RiskTier::Danger, "fork bomb");
        }
        if PIPE_TO_SHELL.is_match(command) {
            return Assessment::of(RiskTier::Danger, "pipes downloaded content into an interpreter");
        }

        let mut assessment = Assessment::safe();
        for caps in SUBSTITUTION.captures_iter(command) {
            if let Some(inner) = caps.get(1).or_else(|| caps.get(2)) {
                assessment = assessment.merge(self.classify(inner.as_str()));
            }
        }

        for segment in split_segments(command) {
            assessment = assessment.merge(classify_segment(&segment));
            if assessment.tier == RiskTier::Danger {
                break;
            }
        }
        assessment
    }

    /// Tier only
    pub fn tier(&self, command: &str) -> RiskTier {
        self.classify(command).tier
    }
}

/// Split at command separators outside quotes
fn split_segments(command: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;
    let mut depth = 0usize;
    let mut chars = command.chars().peekable();

    while let Some(c) = chars.next() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if !in_single => {
                current.push(c);
                escaped = true;
            }
            '\'' if !in_double => {
                in_single = !in_single;
                current.push(c);
            }
            '"' if !in_single => {
                in_double = !in_double;
                current.push(c);
            }
            '(' if !in_single && !in_double => {
                depth += 1;
                current.push(c);
            }
            ')' if !in_single && !in_double => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ';' | '\n' | '|' | '&' if !in_single && !in_double && depth == 0 => {
                // `&>` and `>&` are redirections, not separators.
                if c == '&' && (chars.peek() == Some(&'>') || current.ends_with('>')) {
                    current.push(c);
                    continue;
                }
                if (c == '|' || c == '&') && chars.peek() == Some(&c) {
                    chars.next();
                }
                push_segment(&mut segments, &mut current);
            }
            _ => current.push(c),
        }
    }
    push_segment(&mut segments, &mut current);
    segments
}

fn push_segment(segments: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        segments.push(trimmed.to_string());
    }
    current.clear();
}

fn tokenize(segment: &str) -> Vec<String> {
    shell_words::split(segment)
        .unwrap_or_else(|_| segment.split_whitespace().map(str::to_string).collect())
}

fn program_name(token: &str) -> String {
    let base = token.rsplit(['/', '\\']).next().unwrap_or(token);
    let base = base.strip_suffix(".exe").unwrap_or(base);
    base.to_ascii_lowercase()
}

fn is_env_assignment(token: &str) -> bool {
    match token.split_once('=') {
        Some((name, _)) => {
            !name.is_empty()
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !name.starts_with(|c: char| c.is_ascii_digit())
        }
        None => false,
    }
}

fn classify_segment(segment: &str) -> Assessment {
    let tokens = tokenize(segment);
    classify_tokens(&tokens).merge(classify_redirections(segment))
}

fn classify_tokens(tokens: &[String]) -> Assessment {
    let mut rest = tokens;
    while let Some(first) = rest.first() {
        if is_env_assignment(first) {
            rest = &rest[1..];
        } else {
            break;
        }
    }
    let Some((first, args)) = rest.split_first() else {
        return Assessment::safe();
    };
    let program = program_name(first);
    let program = program.as_str();

    if PRIVILEGE_ESCALATION.contains(&program) {
        return Assessment::of(RiskTier::Danger, "privilege escalation");
    }
    if DISK_TOOLS.contains(&program) || program.starts_with("mkfs") {
        return Assessment::of(RiskTier::Danger, "raw disk or filesystem operation");
    }
    if POWER_COMMANDS.contains(&program) || (program == "init" && has_any(args, &["0", "6"])) {
        return Assessment::of(RiskTier::Danger, "changes the machine's power state");
    }
    if WRAPPERS.contains(&program) {
        return classify_wrapped(program, args);
    }

    match program {
        "rm" => classify_rm(args),
        "rmdir" | "rd" => {
            if has_flag_ci(args, "/s") {
                Assessment::of(RiskTier::Danger, "recursive deletion")
            } else {
                Assessment::of(RiskTier::Caution, "removes directories")
            }
        }
        "del" | "erase" => {
            if has_flag_ci(args, "/s") || has_flag_ci(args, "/q") {
                Assessment::of(RiskTier::Danger, "recursive or unattended deletion")
            } else {
                Assessment::of(RiskTier::Caution, "deletes files")
            }
        }
        "remove-item" | "ri" => {
            if args.iter().any(|a| {
                let a = a.to_ascii_lowercase();
                a.starts_with("-r") || a == "-force"
            }) {
                Assessment::of(RiskTier::Danger, "recursive or forced deletion")
            } else {
                Assessment::of(RiskTier::Caution, "deletes files")
            }
        }
        "chmod" | "chown" | "chgrp" => {
            let recursive = args
                .iter()
                .any(|a| a == "--recursive" || (is_short_flag(a) && a.contains('R')));
            if recursive && args.iter().any(|a| is_sweeping_target(a)) {
                Assessment::of(RiskTier::Danger, "recursive permission change on a system path")
            } else {
                Assessment::of(RiskTier::Caution, "changes ownership or permissions")
            }
        }
        "git" => classify_git(args),
        "sed" | "perl" => {
            if args
                .iter()
                .any(|a| a == "--in-place" || a.starts_with("--in-place=") || (is_short_flag(a) && a.contains('i')))
            {
                Assessment::of(RiskTier::Caution, "edits files in place")
            } else {
                Assessment::safe()
            }
        }
        "find" => classify_find(args),
        "xargs" => {
            let inner = classify_tokens(wrapped_operands(program, args));
            Assessment::of(RiskTier::Caution, "runs a command for every input line").merge(inner)
        }
        "sh" | "bash" | "zsh" | "ksh" | "dash" | "fish" | "pwsh" | "powershell" | "cmd" => {
            match args.iter().position(|a| {
                let a = a.to_ascii_lowercase();
                a == "-c" || a == "-command" || a == "/c"
            }) {
                Some(index) => match args.get(index + 1) {
                    Some(script) => Assessment::of(RiskTier::Caution, "runs a nested shell")
                        .merge(RiskClassifier.classify(script)),
                    None => Assessment::safe(),
                },
                None if args.is_empty() => Assessment::safe(),
                None => Assessment::of(RiskTier::Caution, "runs a script"),
            }
        }
        p if p == "py" || p.starts_with("python") => match args.iter().position(|a| a == "-m") {
            // `python -m pip install` is pip
            Some(index) => classify_tokens(&args[index + 1..]),
            None => Assessment::safe(),
        },
        "curl" | "wget" => {
            if args.iter().any(|a| {
                a == "-o" || a == "-O" || a.starts_with("--output") || a == "--remote-name"
            }) {
                Assessment::of(RiskTier::Caution, "downloads to a file")
            } else if args.iter().any(|a| {
                let a = a.to_ascii_uppercase();
                a == "-XPOST" || a == "-XPUT" || a == "-XDELETE" || a == "POST" || a == "PUT" || a == "DELETE"
            }) {
                Assessment::of(RiskTier::Caution, "sends a mutating HTTP request")
            } else {
                Assessment::safe()
            }
        }
        "tar" => {
            let listing = args
                .first()
                .is_some_and(|a| a == "--list" || (!a.starts_with("--") && a.contains('t')));
            if listing {
                Assessment::safe()
            } else {
                Assessment::of(RiskTier::Caution, "creates or extracts archives")
            }
        }
        "crontab" => {
            if has_any(args, &["-r"]) {
                Assessment::of(RiskTier::Danger, "removes every cron job")
            } else if has_any(args, &["-l"]) {
                Assessment::safe()
            } else {
                Assessment::of(RiskTier::Caution, "modifies scheduled jobs")
            }
        }
        "systemctl" | "service" | "launchctl" | "sc" => {
            if args.iter().any(|a| SERVICE_QUERIES.contains(&a.as_str())) {
                Assessment::safe()
            } else {
                Assessment::of(RiskTier::Caution, "controls system services")
            }
        }
        "docker" | "podman" | "kubectl" | "helm" | "nerdctl" => classify_container(program, args),
        p if PACKAGE_MANAGERS.contains(&p) => {
            if is_package_query(args) {
                Assessment::safe()
            } else {
                Assessment::of(RiskTier::Caution, "installs or removes packages")
            }
        }
        p if LANGUAGE_PACKAGE_MANAGERS.contains(&p) => {
            let mut operands = skip_flags(args);
            // `uv pip install`, `uv tool install`
            if operands.len() > 1 && (operands[0] == "pip" || operands[0] == "tool") {
                operands = skip_flags(&operands[1..]);
            }
            let writes = operands
                .first()
                .is_some_and(|sub| LANGUAGE_PACKAGE_WRITES.contains(&sub.as_str()));
            if writes {
                Assessment::of(RiskTier::Caution, "installs or removes packages")
            } else {
                Assessment::safe()
            }
        }
        p if MUTATING_PROGRAMS.contains(&p) => {
            Assessment::of(RiskTier::Caution, "modifies files or processes")
        }
        _ => Assessment::safe(),
    }
}

fn classify_wrapped(program: &str, args: &[String]) -> Assessment {
    let operands = wrapped_operands(program, args);
    match program {
        // First operand is the duration.
        "timeout" => classify_tokens(operands.get(1..).unwrap_or(&[])),
        // Operands are joined and handed to `sh -c`.
        "watch" => RiskClassifier.classify(&operands.join(" ")),
        "env" => {
            let inner = classify_tokens(operands);
            match args
                .iter()
                .position(|a| a == "-S" || a == "--split-string")
                .and_then(|index| args.get(index + 1))
            {
                Some(script) => inner.merge(RiskClassifier.classify(script)),
                None => inner,
            }
        }
        _ => classify_tokens(operands),
    }
}

fn classify_rm(args: &[String]) -> Assessment {
    let forceful = args.iter().any(|a| {
        a == "--recursive"
            || a == "--force"
            || a == "--no-preserve-root"
            || (is_short_flag(a) && a.chars().any(|c| matches!(c, 'r' | 'R' | 'f')))
    });
    if forceful {
        return Assessment::of(RiskTier::Danger, "recursive or forced deletion");
    }
    if args.iter().any(|a| is_sweeping_target(a)) {
        return Assessment::of(RiskTier::Danger, "deletes a home, root or wildcard path");
    }
    Assessment::of(RiskTier::Caution, "deletes files")
}

fn classify_git(args: &[String]) -> Assessment {
    let mut rest = args;
    // Global options such as `-C <path>` precede the subcommand.
    while let Some(first) = rest.first() {
        if first == "-C" || first == "-c" || first == "--git-dir" || first == "--work-tree" {
            rest = rest.get(2..).unwrap_or(&[]);
        } else if first.starts_with('-') {
            rest = &rest[1..];
        } else {
            break;
        }
    }
    let Some((sub, sub_args)) = rest.split_first() else {
        return Assessment::safe();
    };

    match sub.as_str() {
        "push"
            if sub_args.iter().any(|a| {
                a == "--force" || a == "-f" || a.starts_with("--force-with-lease") || a == "--mirror" || a == "--delete"
            }) =>
        {
            Assessment::of(RiskTier::Danger, "rewrites remote history")
        }
        "clean" if sub_args.iter().any(|a| is_short_flag(a) && a.contains('x')) => {
            Assessment::of(RiskTier::Danger, "deletes untracked and ignored files")
        }
        s if GIT_WRITES.contains(&s) => {
            if s == "branch" && !sub_args.iter().any(|a| is_short_flag(a) && (a.contains('d') || a.contains('D') || a.contains('m'))) {
                Assessment::safe()
            } else if s == "stash" && sub_args.first().is_some_and(|a| a == "list" || a == "show") {
                Assessment::safe()
            } else if s == "tag" && sub_args.is_empty() {
                Assessment::safe()
            } else {
                Assessment::of(RiskTier::Caution, "changes the repository")
            }
        }
        _ => Assessment::safe(),
    }
}

fn classify_find(args: &[String]) -> Assessment {
    let mut assessment = Assessment::safe();
    for (index, arg) in args.iter().enumerate() {
        match arg.as_str() {
            "-delete" => {
                return Assessment::of(RiskTier::Danger, "deletes every match");
            }
            "-exec" | "-execdir" | "-ok" | "-okdir" => {
                let tail = &args[index + 1..];
                let end = tail
                    .iter()
                    .position(|a| a == ";" || a == "\\;" || a == "+")
                    .unwrap_or(tail.len());
                let inner = classify_tokens(&tail[..end]);
                assessment = assessment
                    .merge(Assessment::of(RiskTier::Caution, "runs a command for every match"))
                    .merge(inner);
            }
            "-fprint" | "-fprintf" | "-fls" => {
                assessment =
                    assessment.merge(Assessment::of(RiskTier::Caution, "writes results to a file"));
            }
            _ => {}
        }
    }
    assessment
}

fn classify_container(program: &str, args: &[String]) -> Assessment {
    let operands = skip_flags(args);
    let Some(sub) = operands.first() else {
        return Assessment::safe();
    };
    if CONTAINER_QUERIES.contains(&sub.as_str()) {
        return Assessment::safe();
    }
    if program != "kubectl"
        && program != "helm"
        && sub == "run"
        && operands.iter().any(|a| a == "--privileged")
    {
        return Assessment::of(RiskTier::Danger, "starts a privileged container");
    }
    if matches!(sub.as_str(), "system" | "volume" | "image" | "container")
        && operands.get(1).is_some_and(|a| a == "prune")
    {
        return Assessment::of(RiskTier::Danger, "prunes container resources");
    }
    Assessment::of(RiskTier::Caution, "changes containers or cluster state")
}

fn is_package_query(args: &[String]) -> bool {
    match args.first() {
        Some(first) if first.starts_with("-Q") || first == "-Ss" || first == "-Si" => true,
        Some(first) => PACKAGE_QUERIES.contains(&first.as_str()),
        None => true,
    }
}

fn classify_redirections(segment: &str) -> Assessment {
    let mut assessment = Assessment::safe();
    for caps in REDIRECTION.captures_iter(segment) {
        let Some(target) = caps.get(1).map(|m| m.as_str()) else {
            continue;
        };
        let target = target.trim_matches(|c| c == '"' || c == '\'');
        if target.starts_with('&') || HARMLESS_REDIRECT_TARGETS.contains(&target) {
            continue;
        }
        if BLOCK_DEVICE_PREFIXES.iter().any(|prefix| target.starts_with(prefix)) {
            return Assessment::of(RiskTier::Danger, "writes directly to a block device");
        }
        assessment = assessment.merge(Assessment::of(RiskTier::Caution, "writes output to a file"));
    }
    assessment
}

fn is_short_flag(arg: &str) -> bool {
    arg.starts_with('-') && !arg.starts_with("--") && arg.len() > 1
}

fn is_sweeping_target(arg: &str) -> bool {
    SWEEPING_TARGETS.contains(&arg)
}

fn has_any(args: &[String], wanted: &[&str]) -> bool {
    args.iter().any(|a| wanted.contains(&a.as_str()))
}

fn has_flag_ci(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a.eq_ignore_ascii_case(flag))
}

/// The command a wrapper runs: `nice -n 10 rm x` gives `rm x`
fn wrapped_operands<'a>(program: &str, args: &'a [String]) -> &'a [String] {
    let value_options = VALUE_OPTIONS
        .iter()
        .find(|(name, _)| *name == program)
        .map_or(&[][..], |(_, options)| *options);

    let mut index = 0;
    while let Some(arg) = args.get(index) {
        if arg == "--" {
            index += 1;
            break;
        }
        if !arg.starts_with('-') {
            break;
        }
        index += if value_options.contains(&arg.as_str()) { 2 } else { 1 };
    }
    args.get(index..).unwrap_or(&[])
}

/// Drop leading option flags
fn skip_flags(args: &[String]) -> &[String] {
    let start = args
        .iter()
        .position(|a| !a.starts_with('-'))
        .unwrap_or(args.len());
    &args[start..]
}
