#![allow(dead_code)]

use std::path::{Path, PathBuf};

use goimpl::{BuildContext, EmitComments, Implementer, Options};

pub fn testdata() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

/// Build context rooted entirely inside `testdata/`.
pub fn context() -> BuildContext {
    let root = testdata();
    BuildContext::new(root.join("goroot"), vec![root.join("gopath")])
}

pub fn implementer() -> Implementer {
    Implementer::new(context())
}

/// A directory of the `example.com/impltest` module.
pub fn module_dir(pkg: &str) -> PathBuf {
    testdata().join("mod").join(pkg)
}

pub fn options(pkg: &str) -> Options {
    Options::new(module_dir(pkg))
}

pub fn without_comments(pkg: &str) -> Options {
    Options {
        comments: EmitComments::Without,
        ..options(pkg)
    }
}

/// `func (<recv>) <sig> {` + the standard body.
pub fn stub(recv: &str, sig: &str) -> String {
    format!("func ({recv}) {sig} {{\n\tpanic(\"not implemented\") // TODO: Implement\n}}\n\n")
}
