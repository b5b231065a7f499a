mod common;

use std::path::Path;

use common::{implementer, module_dir, options, testdata, without_comments};
use goimpl::locator::ModuleResolver;
use goimpl::{Error, MethodSignature, Options, SourceFs};

/// `Name(a T, _ U) (R, error)`-style one-liners for comparison.
fn sigs(methods: &[MethodSignature]) -> Vec<String> {
    let list = |params: &[goimpl::Param]| {
        params
            .iter()
            .map(|p| if p.name.is_empty() { p.typ.clone() } else { format!("{} {}", p.name, p.typ) })
            .collect::<Vec<_>>()
            .join(", ")
    };
    methods
        .iter()
        .map(|m| {
            let results = match m.results.as_slice() {
                [] => String::new(),
                [r] if r.name.is_empty() => format!(" {}", r.typ),
                rs => format!(" ({})", list(rs)),
            };
            format!("{}({}){}", m.name, list(&m.params), results)
        })
        .collect()
}

fn resolve(iface: &str, opts: &Options) -> Result<Vec<String>, Error> {
    implementer().resolve_interface(iface, opts).map(|m| sigs(&m))
}

#[test]
fn read_writer_from_the_standard_library() {
    let got = resolve("io.ReadWriter", &options("recv")).unwrap();
    assert_eq!(got, ["Read(p []byte) (n int, err error)", "Write(p []byte) (n int, err error)"]);

    let got = resolve("io.WriterTo", &options("recv")).unwrap();
    assert_eq!(got, ["WriteTo(w io.Writer) (n int64, err error)"]);
}

#[test]
fn fully_qualified_standard_library_path() {
    let got = resolve("net/http.Handler", &options("recv")).unwrap();
    assert_eq!(got, ["ServeHTTP(_ http.ResponseWriter, _ *http.Request)"]);

    let got = resolve("http.ResponseWriter", &options("recv")).unwrap();
    assert_eq!(
        got,
        [
            "Header() http.Header",
            "Write(_ []byte) (int, error)",
            "WriteHeader(statusCode int)",
        ]
    );
}

#[test]
fn qualification_depends_on_the_emitting_package() {
    let elsewhere = resolve("iface.Store", &options("recv")).unwrap();
    assert_eq!(
        elsewhere,
        [
            "Get(key iface.Key) (*iface.Item, error)",
            "Put(_ iface.Key, _ *iface.Item) error",
            "List(ctx context.Context, filter func(iface.Item) bool) ([]iface.Item, error)",
            "Watch(ctx context.Context) (<-chan iface.Item, error)",
            "Digest(keys [2 * iface.DigestSize]iface.Key, whence [io.SeekEnd]byte) [iface.DigestSize]byte",
        ]
    );

    let same = Options {
        recv_pkg: Some("iface".to_string()),
        ..options("iface")
    };
    let local = resolve("Store", &same).unwrap();
    assert_eq!(
        local,
        [
            "Get(key Key) (*Item, error)",
            "Put(_ Key, _ *Item) error",
            "List(ctx context.Context, filter func(Item) bool) ([]Item, error)",
            "Watch(ctx context.Context) (<-chan Item, error)",
            "Digest(keys [2 * DigestSize]Key, whence [io.SeekEnd]byte) [DigestSize]byte",
        ]
    );
}

#[test]
fn generic_interface_is_instantiated() {
    let got = resolve("generic.GenericInterface1[string]", &options("recv")).unwrap();
    assert_eq!(got, ["Method1() string", "Method2(_ string)", "Method3(_ string) string"]);

    let got = resolve("generic.GenericInterface2[string, bool]", &options("recv")).unwrap();
    assert_eq!(
        got,
        ["Method1() (string, bool)", "Method2(_ string) bool", "Method3(_ string, _ bool) bool"]
    );
}

#[test]
fn type_arguments_are_substituted_inside_composite_types() {
    let got = resolve("example.com/impltest/generic.Cache[string, []byte]", &options("recv")).unwrap();
    assert_eq!(
        got,
        [
            "Get(ctx context.Context, key string) ([]byte, bool)",
            "GetMany(keys []string) map[string][]byte",
            "Each(fn func(string, []byte) error) error",
            "Pairs() []generic.Pair[string, []byte]",
        ]
    );
}

#[test]
fn arity_must_match() {
    let opts = options("recv");
    for iface in [
        "generic.GenericInterface1",
        "generic.GenericInterface1[string, int]",
        "generic.GenericInterface2[string]",
    ] {
        let err = resolve(iface, &opts).unwrap_err();
        let Error::InterfaceNotFound { source, .. } = &err else {
            panic!("{iface}: expected not found, got {err}");
        };
        assert!(matches!(**source, Error::TypeNotFound { .. }), "{iface}: {err}");
    }
}

#[test]
fn embedded_methods_are_spliced_in_place() {
    let got = resolve("hash.Hash32", &options("recv")).unwrap();
    assert_eq!(
        got,
        [
            "Write(p []byte) (n int, err error)",
            "Sum(b []byte) []byte",
            "Reset()",
            "Size() int",
            "BlockSize() int",
            "Sum32() uint32",
        ]
    );

    let got = resolve("generic.Embedder[float64]", &options("recv")).unwrap();
    assert_eq!(
        got,
        [
            "Method1() float64",
            "Method2(_ float64)",
            "Method3(_ float64) float64",
            "Close() error",
        ]
    );
}

#[test]
fn embedded_interface_comments_stay_behind() {
    let methods = implementer().resolve_interface("hash.Hash", &options("recv")).unwrap();
    assert_eq!(methods[0].name, "Write");
    assert_eq!(methods[0].doc, None);
    assert_eq!(
        methods[1].doc.as_deref(),
        Some(
            "// Sum appends the current hash to b and returns the resulting slice.\n\
             // It does not change the underlying hash state.\n"
        )
    );
}

#[test]
fn comments_can_be_switched_off() {
    let methods = implementer().resolve_interface("hash.Hash", &without_comments("recv")).unwrap();
    assert!(methods.iter().all(|m| m.doc.is_none()));
}

#[test]
fn free_floating_comments_are_not_attached() {
    let methods = implementer().resolve_interface("iface.Interface9", &options("recv")).unwrap();
    assert_eq!(methods.len(), 1);
    assert_eq!(
        methods[0].doc.as_deref(),
        Some("// Method1 is the first method of Interface1.\n// line two\n")
    );
}

#[test]
fn builtin_error_needs_no_lookup() {
    let opts = Options::new("/definitely/not/a/dir");
    assert_eq!(resolve("error", &opts).unwrap(), ["Error() string"]);

    assert_eq!(
        resolve("iface.Failure", &options("recv")).unwrap(),
        ["Error() string", "Code() int"]
    );
}

#[test]
fn aliases_and_defined_interface_types() {
    assert_eq!(
        resolve("iface.Reader", &options("recv")).unwrap(),
        ["Read(p []byte) (n int, err error)"]
    );
    assert_eq!(
        resolve("iface.ReadCloser", &options("recv")).unwrap(),
        ["Read(p []byte) (n int, err error)", "Close() error"]
    );
}

#[test]
fn packages_from_the_module_cache_and_gopath() {
    let got = resolve("example.com/impltest/widgetuse.Spinning", &options("recv")).unwrap();
    assert_eq!(got, ["Spin(d time.Duration) error", "Stop()"]);

    let got = resolve("widgets.Spinner", &options("recv")).unwrap();
    assert_eq!(got, ["Spin(d time.Duration) error"]);

    let got = resolve("legacy/tools.Tool", &options("recv")).unwrap();
    assert_eq!(got, ["Run(args ...string) error"]);
}

#[test]
fn build_constraints_hide_files() {
    // Declared only in seek_windows.go, so no package named io offers it.
    let err = resolve("io.Seeker", &options("recv")).unwrap_err();
    assert_eq!(err.to_string(), "unrecognized interface: io.Seeker");

    // gen.go is `package main` behind `//go:build ignore`.
    assert!(resolve("io.Closer", &options("recv")).is_ok());
}

#[test]
fn shape_errors() {
    let opts = options("recv");
    let err = resolve("iface.Point", &opts).unwrap_err();
    assert_eq!(err.to_string(), "not an interface: iface.Point");

    let err = resolve("iface.Empty", &opts).unwrap_err();
    assert_eq!(err.to_string(), "empty interface: iface.Empty");

    let err = resolve("iface.Number", &opts).unwrap_err();
    assert!(matches!(err, Error::ConstraintInterface(_)), "{err}");
}

#[test]
fn embedding_cycles_are_reported() {
    let err = resolve("iface.Loop", &options("recv")).unwrap_err();
    match err {
        Error::EmbeddingCycle { chain } => assert_eq!(chain, ["iface.Loop", "iface.Loop2", "iface.Loop"]),
        other => panic!("expected a cycle, got {other}"),
    }
}

#[test]
fn lookup_errors_keep_the_reference() {
    let opts = options("recv");
    let err = resolve("tennis.Racket", &opts).unwrap_err();
    assert_eq!(err.to_string(), "unrecognized interface: tennis.Racket");

    let err = resolve("example.com/nowhere.Thing", &opts).unwrap_err();
    assert!(
        err.to_string()
            .starts_with("interface example.com/nowhere.Thing not found: couldn't find package example.com/nowhere"),
        "{err}"
    );

    let err = resolve("Missing", &opts).unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("interface Missing not found: type Missing not found in {}", module_dir("recv").display())
    );
}

/// Fails the test if any package lookup happens.
struct NoLookups;

impl ModuleResolver for NoLookups {
    fn package_dir(&self, _: &dyn SourceFs, path: &str, _: &Path) -> goimpl::Result<std::path::PathBuf> {
        panic!("unexpected package lookup for {path}")
    }
    fn main_modules(&self, _: &dyn SourceFs, _: &Path) -> Vec<(String, std::path::PathBuf)> {
        panic!("unexpected module listing")
    }
    fn required_modules(&self, _: &dyn SourceFs, _: &Path) -> Vec<(String, std::path::PathBuf)> {
        panic!("unexpected module listing")
    }
}

#[test]
fn malformed_references_fail_before_any_lookup() {
    let imp = implementer().with_module_resolver(NoLookups);
    let opts = Options::new(testdata());
    for (iface, want) in [
        ("net/http/httputil", "invalid interface name: net/http/httputil"),
        ("net/http/", "interface name cannot end with a '/' character: net/http/"),
        ("net/http.", "interface name cannot end with a '.' character: net/http."),
        ("a b", "couldn't parse interface: a b"),
    ] {
        let err = imp.resolve_interface(iface, &opts).unwrap_err();
        assert_eq!(err.to_string(), want);
    }
}
