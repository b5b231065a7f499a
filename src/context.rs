//! Default Go build context: where sources live and which build tags hold.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Highest `go1.N` release tag considered satisfied.
pub const GO_MINOR_VERSION: u32 = 25;

pub const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js",
    "linux", "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

pub const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

pub const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips",
    "mipsle", "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le",
    "riscv", "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub goroot: PathBuf,
    pub gopath: Vec<PathBuf>,
    pub gomodcache: PathBuf,
    pub goos: String,
    pub goarch: String,
    pub cgo_enabled: bool,
    pub compiler: String,
    /// `go1.1` through `go1.<go_minor>` are satisfied.
    pub go_minor: u32,
}

impl BuildContext {
    /// Context for explicit roots, targeting linux/amd64 without cgo.
    pub fn new(goroot: impl Into<PathBuf>, gopath: Vec<PathBuf>) -> Self {
        let gomodcache = default_modcache(&gopath);
        Self {
            goroot: goroot.into(),
            gopath,
            gomodcache,
            goos: "linux".to_string(),
            goarch: "amd64".to_string(),
            cgo_enabled: false,
            compiler: "gc".to_string(),
            go_minor: GO_MINOR_VERSION,
        }
    }

    /// Context read from the usual Go environment variables.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let goroot = var("GOROOT")
            .map(PathBuf::from)
            .or_else(goroot_from_toolchain)
            .unwrap_or_else(|| PathBuf::from("/usr/local/go"));

        let gopath: Vec<PathBuf> = match var("GOPATH") {
            Some(list) => std::env::split_paths(&list).collect(),
            None => var("HOME")
                .map(|home| vec![Path::new(&home).join("go")])
                .unwrap_or_default(),
        };

        let mut ctx = Self::new(goroot, gopath);
        if let Some(cache) = var("GOMODCACHE") {
            ctx.gomodcache = PathBuf::from(cache);
        }
        ctx.goos = var("GOOS").unwrap_or_else(|| host_os().to_string());
        ctx.goarch = var("GOARCH").unwrap_or_else(|| host_arch().to_string());
        ctx.cgo_enabled = match var("CGO_ENABLED") {
            Some(v) => v == "1",
            None => ctx.goos == host_os() && ctx.goarch == host_arch(),
        };
        tracing::debug!(goroot = %ctx.goroot.display(), goos = %ctx.goos, goarch = %ctx.goarch, "build context from environment");
        ctx
    }

    pub fn with_target(mut self, goos: &str, goarch: &str) -> Self {
        self.goos = goos.to_string();
        self.goarch = goarch.to_string();
        self
    }

    /// Reports whether a build tag holds in this context.
    pub fn satisfies_tag(&self, tag: &str) -> bool {
        if tag == self.goos || tag == self.goarch || tag == self.compiler {
            return true;
        }
        match tag {
            "unix" => UNIX_OS.contains(&self.goos.as_str()),
            "cgo" => self.cgo_enabled,
            "linux" => self.goos == "android",
            "solaris" => self.goos == "illumos",
            "darwin" => self.goos == "ios",
            _ => tag
                .strip_prefix("go1.")
                .and_then(|minor| minor.parse::<u32>().ok())
                .is_some_and(|minor| minor >= 1 && minor <= self.go_minor),
        }
    }
}

fn default_modcache(gopath: &[PathBuf]) -> PathBuf {
    gopath
        .first()
        .map(|p| p.join("pkg").join("mod"))
        .unwrap_or_else(|| PathBuf::from("pkg/mod"))
}

fn goroot_from_toolchain() -> Option<PathBuf> {
    let out = Command::new("go").args(["env", "GOROOT"]).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let root = String::from_utf8(out.stdout).ok()?;
    let root = root.trim();
    (!root.is_empty()).then(|| PathBuf::from(root))
}

fn host_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_and_platform_tags() {
        let ctx = BuildContext::new("/goroot", vec![PathBuf::from("/gopath")]);
        assert!(ctx.satisfies_tag("linux"));
        assert!(ctx.satisfies_tag("amd64"));
        assert!(ctx.satisfies_tag("unix"));
        assert!(ctx.satisfies_tag("gc"));
        assert!(ctx.satisfies_tag("go1.18"));
        assert!(!ctx.satisfies_tag("go1.99"));
        assert!(!ctx.satisfies_tag("windows"));
        assert!(!ctx.satisfies_tag("cgo"));
        assert_eq!(ctx.gomodcache, PathBuf::from("/gopath/pkg/mod"));
    }

    #[test]
    fn android_implies_linux() {
        let ctx = BuildContext::new("/goroot", vec![]).with_target("android", "arm64");
        assert!(ctx.satisfies_tag("linux"));
        assert!(ctx.satisfies_tag("android"));
        assert!(!ctx.satisfies_tag("darwin"));
    }
}
