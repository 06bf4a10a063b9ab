//! End-to-end resolution tests
//!
//! Each test builds contribution roots in a temp dir, loads them in order,
//! and checks the flattened bundle.

mod fixtures;

use fixtures::Tree;
use rc_records::{encode, Format, Value};
use release_config::{ReleaseConfigError, ReleaseConfigs};
use std::path::PathBuf;

fn resolve(maps: &[PathBuf], target: &str) -> Result<ReleaseConfigs, ReleaseConfigError> {
    ReleaseConfigs::read_release_config_maps(maps, target, false)
}

fn value_in(configs: &ReleaseConfigs, release: &str, flag: &str) -> Option<Value> {
    configs
        .artifact()
        .unwrap()
        .release(release)
        .and_then(|rc| rc.value_of(flag))
        .cloned()
}

// =============================================================================
// Layering
// =============================================================================

#[test]
fn test_child_overrides_inherited_default() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.flag("FOO", "off").release("base", &[]);
    let d1 = tree.root("d1");
    d1.release("child", &["base"]).value("child", "FOO", "on");

    let configs = resolve(&[d0.map_path(), d1.map_path()], "child").unwrap();

    assert_eq!(value_in(&configs, "child", "FOO"), Some(Value::string("on")));
    assert_eq!(value_in(&configs, "base", "FOO"), Some(Value::string("off")));
    assert_eq!(configs.artifact().unwrap().release_config.name, "child");
}

#[test]
fn test_transitive_inheritance() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.flag("FOO", "default")
        .release("r3", &[])
        .release("r2", &["r3"])
        .release("r1", &["r2"])
        .value("r3", "FOO", "from_r3");

    let configs = resolve(&[d0.map_path()], "r1").unwrap();

    assert_eq!(value_in(&configs, "r1", "FOO"), Some(Value::string("from_r3")));
    let r1 = configs.release("r1").unwrap();
    let ancestors: Vec<_> = r1.ancestors().unwrap().iter().cloned().collect();
    assert_eq!(ancestors, vec!["r2", "r3"]);
}

#[test]
fn test_own_value_beats_every_ancestor() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.flag("FOO", "default")
        .release("a", &[])
        .release("b", &[])
        .release("r", &["a", "b"])
        .value("a", "FOO", "from_a")
        .value("b", "FOO", "from_b")
        .value("r", "FOO", "mine");

    let configs = resolve(&[d0.map_path()], "r").unwrap();
    assert_eq!(value_in(&configs, "r", "FOO"), Some(Value::string("mine")));
}

#[test]
fn test_later_inherit_entry_wins() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.flag("FOO", "default")
        .release("a", &[])
        .release("b", &[])
        .release("ab", &["a", "b"])
        .release("ba", &["b", "a"])
        .value("a", "FOO", "from_a")
        .value("b", "FOO", "from_b");

    let configs = resolve(&[d0.map_path()], "ab").unwrap();
    assert_eq!(value_in(&configs, "ab", "FOO"), Some(Value::string("from_b")));
    assert_eq!(value_in(&configs, "ba", "FOO"), Some(Value::string("from_a")));
}

#[test]
fn test_higher_rank_wins_and_traces_keep_order() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.flag("F", "default").release("x", &[]).value("x", "F", "zero");
    let d1 = tree.root("d1");
    d1.release("x", &[]).value("x", "F", "one");

    let configs = resolve(&[d0.map_path(), d1.map_path()], "x").unwrap();
    let x = &configs.artifact().unwrap().release_config;
    let flag = x.flag("F").unwrap();

    assert_eq!(flag.value, Value::string("one"));
    let sources: Vec<_> = flag.traces.iter().map(|t| PathBuf::from(&t.source)).collect();
    assert_eq!(
        sources,
        vec![
            d0.dir.join("flag_declarations/F.toml"),
            d0.dir.join("flag_values/x/F.toml"),
            d1.dir.join("flag_values/x/F.toml"),
        ]
    );
    assert_eq!(
        x.directories,
        vec![d0.dir.display().to_string(), d1.dir.display().to_string()]
    );
}

#[test]
fn test_inherit_lists_merge_across_roots() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.release("r", &[]).release("a", &[]);
    let d1 = tree.root("d1");
    d1.release("r", &["a"]);

    let configs = resolve(&[d0.map_path(), d1.map_path()], "r").unwrap();
    assert_eq!(configs.release("r").unwrap().inherit_names, vec!["a"]);
    assert_eq!(configs.artifact().unwrap().release_config.inherits, vec!["a"]);
}

#[test]
fn test_resolution_is_idempotent() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.map(&["system"], &[("next", "trunk_staging")])
        .flag("FOO", "off")
        .flag("BAR", "1")
        .release("trunk_staging", &[])
        .release("ap3a", &["next"])
        .value("ap3a", "BAR", "2");
    let maps = vec![d0.map_path()];

    let path = PathBuf::from("all.json");
    let first = resolve(&maps, "ap3a").unwrap();
    let second = resolve(&maps, "ap3a").unwrap();
    assert_eq!(
        encode(first.artifact().unwrap(), Format::Json, &path).unwrap(),
        encode(second.artifact().unwrap(), Format::Json, &path).unwrap()
    );

    let mut again = first.clone();
    let regenerated = again.generate("ap3a").unwrap().clone();
    assert_eq!(&regenerated, first.artifact().unwrap());
}

// =============================================================================
// Aliases
// =============================================================================

#[test]
fn test_alias_chain_resolves_to_release() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.map(&["system"], &[("a", "b"), ("b", "c")]).release("c", &[]);

    let configs = resolve(&[d0.map_path()], "a").unwrap();
    let target = &configs.artifact().unwrap().release_config;
    assert_eq!(target.name, "c");
    assert_eq!(target.other_names, vec!["a", "b"]);
    assert_eq!(configs.all_release_names(), vec!["a", "b", "c"]);
}

#[test]
fn test_alias_cycle_is_reported() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.map(&["system"], &[("a", "b"), ("b", "a")]).release("c", &[]);

    let err = resolve(&[d0.map_path()], "c").unwrap_err();
    match err {
        ReleaseConfigError::AliasCycle { trace } => {
            assert_eq!(trace.first(), trace.last());
            assert!(trace.len() >= 3);
        }
        other => panic!("expected AliasCycle, got {other:?}"),
    }
}

#[test]
fn test_dangling_alias_fails() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.map(&["system"], &[("next", "missing")]).release("c", &[]);

    let err = resolve(&[d0.map_path()], "c").unwrap_err();
    assert!(matches!(err, ReleaseConfigError::DanglingAlias { .. }));
}

#[test]
fn test_alias_shadowing_release_fails() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.map(&["system"], &[("c", "d")]).release("c", &[]).release("d", &[]);

    let err = resolve(&[d0.map_path()], "d").unwrap_err();
    assert!(matches!(err, ReleaseConfigError::AliasShadowsRelease { .. }));
}

#[test]
fn test_conflicting_alias_across_roots() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.map(&["system"], &[("next", "a")]).release("a", &[]).release("b", &[]);
    let d1 = tree.root("d1");
    d1.map(&["system"], &[("next", "b")]);

    let err = resolve(&[d0.map_path(), d1.map_path()], "a").unwrap_err();
    assert!(matches!(err, ReleaseConfigError::ConflictingAlias { .. }));
}

#[test]
fn test_inherit_through_alias() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.map(&["system"], &[("next", "base")])
        .flag("FOO", "off")
        .release("base", &[])
        .release("child", &["next"])
        .value("base", "FOO", "on");

    let configs = resolve(&[d0.map_path()], "child").unwrap();
    assert_eq!(value_in(&configs, "child", "FOO"), Some(Value::string("on")));
}

// =============================================================================
// Declarations and validation
// =============================================================================

#[test]
fn test_identical_duplicate_declaration_is_accepted() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.flag("FOO", "off").release("r", &[]);
    let d1 = tree.root("d1");
    d1.flag("FOO", "off");

    assert!(resolve(&[d0.map_path(), d1.map_path()], "r").is_ok());
}

#[test]
fn test_identical_duplicate_declaration_keeps_inherited_value() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.flag("FOO", "off")
        .release("a", &[])
        .release("b", &[])
        .release("c", &["a", "b"])
        .value("a", "FOO", "on");
    let d1 = tree.root("d1");
    d1.flag("FOO", "off");

    let configs = resolve(&[d0.map_path(), d1.map_path()], "c").unwrap();
    assert_eq!(value_in(&configs, "c", "FOO"), Some(Value::string("on")));

    let c = &configs.artifact().unwrap().release_config;
    let sources: Vec<_> = c
        .flag("FOO")
        .unwrap()
        .traces
        .iter()
        .map(|t| PathBuf::from(&t.source))
        .collect();
    assert_eq!(
        sources,
        vec![
            d0.dir.join("flag_declarations/FOO.toml"),
            d0.dir.join("flag_values/a/FOO.toml"),
        ]
    );
    assert!(configs
        .files_used()
        .contains(&d1.dir.join("flag_declarations/FOO.toml")));
}

#[test]
fn test_differing_duplicate_declaration_fails() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.flag("FOO", "off").release("r", &[]);
    let d1 = tree.root("d1");
    d1.flag("FOO", "on");

    let err = resolve(&[d0.map_path(), d1.map_path()], "r").unwrap_err();
    assert!(matches!(
        err,
        ReleaseConfigError::DuplicateFlagDeclaration { ref name, .. } if name == "FOO"
    ));
}

#[test]
fn test_flag_value_name_mismatch() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.flag("FOO", "off")
        .flag("BAR", "off")
        .release("trunk_staging", &[])
        .value_raw(
            "trunk_staging",
            "FOO",
            "name = \"BAR\"\nvalue = { string_value = \"on\" }\n",
        );

    let err = resolve(&[d0.map_path()], "trunk_staging").unwrap_err();
    assert!(matches!(err, ReleaseConfigError::NameMismatch { .. }));
}

#[test]
fn test_release_file_name_mismatch() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.write("release_configs/foo.toml", "name = \"bar\"\n");

    let err = resolve(&[d0.map_path()], "bar").unwrap_err();
    assert!(matches!(err, ReleaseConfigError::NameMismatch { .. }));
}

#[test]
fn test_inheritance_cycle_is_reported() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.release("a", &["b"]).release("b", &["a"]);

    let err = resolve(&[d0.map_path()], "a").unwrap_err();
    match err {
        ReleaseConfigError::InheritanceCycle { cycle } => {
            assert_eq!(cycle, vec!["a", "b", "a"]);
        }
        other => panic!("expected InheritanceCycle, got {other:?}"),
    }
}

#[test]
fn test_unknown_inherited_release() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.release("a", &["ghost"]);

    let err = resolve(&[d0.map_path()], "a").unwrap_err();
    assert!(matches!(
        err,
        ReleaseConfigError::UnknownInheritedRelease { ref inherited, .. } if inherited == "ghost"
    ));
}

#[test]
fn test_value_for_undefined_flag() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.release("r", &[]).value("r", "NOPE", "x");

    let err = resolve(&[d0.map_path()], "r").unwrap_err();
    assert!(matches!(err, ReleaseConfigError::UndefinedFlag { .. }));
}

#[test]
fn test_value_before_declaration() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.release("r", &[]).value("r", "LATE", "x");
    let d1 = tree.root("d1");
    d1.flag("LATE", "default");

    let err = resolve(&[d0.map_path(), d1.map_path()], "r").unwrap_err();
    assert!(matches!(err, ReleaseConfigError::ValueBeforeDeclaration { .. }));
}

#[test]
fn test_missing_default_containers() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.write("release_config_map.toml", "description = \"no containers\"\n");

    let err = resolve(&[d0.map_path()], "r").unwrap_err();
    assert!(matches!(err, ReleaseConfigError::InvalidContributionRoot { .. }));
}

#[test]
fn test_reserved_flag_name() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.flag("RELEASE_ACONFIG_VALUE_SETS", "x");

    let err = resolve(&[d0.map_path()], "r").unwrap_err();
    assert!(matches!(err, ReleaseConfigError::ReservedFlagName { .. }));
}

#[test]
fn test_root_only_sets_manual_flags() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.flag("AUTO", "off")
        .flag_with("HAND", "off", "MANUAL", "")
        .release("root", &[])
        .release("r", &[])
        .value("root", "HAND", "on");

    let configs = resolve(&[d0.map_path()], "r").unwrap();
    assert_eq!(value_in(&configs, "r", "HAND"), Some(Value::string("on")));
    assert_eq!(configs.artifact().unwrap().release_config.inherits, vec!["root"]);

    d0.value("root", "AUTO", "on");
    let err = resolve(&[d0.map_path()], "r").unwrap_err();
    assert!(matches!(err, ReleaseConfigError::RootNonManualFlag { .. }));
}

#[test]
fn test_flags_only_release_rejects_values() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.flag("FOO", "off")
        .release_with("r", &[], "aconfig_flags_only = true\n")
        .value("r", "FOO", "on");

    let err = resolve(&[d0.map_path()], "r").unwrap_err();
    assert!(matches!(err, ReleaseConfigError::FlagOverridesNotAllowed { .. }));
}

#[test]
fn test_redacted_value_removes_flag() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.flag("SECRET", "off")
        .release("r", &[])
        .value_raw("r", "SECRET", "name = \"SECRET\"\nredacted = true\n");

    let configs = resolve(&[d0.map_path()], "r").unwrap();
    assert_eq!(value_in(&configs, "r", "SECRET"), None);
}

#[test]
fn test_redacted_value_never_reaches_bundle() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.flag("SECRET", "off")
        .release("p", &[])
        .release("c", &["p"])
        .value_raw(
            "p",
            "SECRET",
            "name = \"SECRET\"\nvalue = { string_value = \"hunter2\" }\nredacted = true\n",
        );

    let configs = resolve(&[d0.map_path()], "c").unwrap();
    assert_eq!(value_in(&configs, "p", "SECRET"), None);
    assert_eq!(value_in(&configs, "c", "SECRET"), Some(Value::string("off")));

    let bundle = configs.artifact().unwrap();
    for format in [Format::Json, Format::Text] {
        let bytes = encode(bundle, format, &PathBuf::from("all")).unwrap();
        assert!(!String::from_utf8(bytes).unwrap().contains("hunter2"));
    }
}

#[test]
fn test_redacted_default_declaration_fails() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.flag_with("SECRET", "x", "LAUNCH", "redacted = true\n");

    let err = resolve(&[d0.map_path()], "r").unwrap_err();
    assert!(matches!(
        err,
        ReleaseConfigError::DefaultMustNotBeRedacted { ref name, .. } if name == "SECRET"
    ));
}

#[test]
fn test_invalid_flag_container() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.flag_with("FOO", "x", "LAUNCH", "containers = [\"odm\"]\n");

    let err = resolve(&[d0.map_path()], "r").unwrap_err();
    assert!(matches!(
        err,
        ReleaseConfigError::InvalidContainer { ref container, .. } if container == "odm"
    ));
}

#[test]
fn test_invalid_default_container() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.map(&["system", "odm"], &[]);

    let err = resolve(&[d0.map_path()], "r").unwrap_err();
    assert!(matches!(err, ReleaseConfigError::InvalidContributionRoot { .. }));
}

#[test]
fn test_obsolete_flag_cannot_be_reassigned() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.flag("OLD", "x")
        .release("a", &[])
        .release("b", &["a"])
        .value_raw("a", "OLD", "name = \"OLD\"\nvalue = { obsolete = true }\n")
        .value("b", "OLD", "y");

    let err = resolve(&[d0.map_path()], "b").unwrap_err();
    assert!(matches!(err, ReleaseConfigError::ObsoleteFlag { .. }));
}

// =============================================================================
// Value sets, fallback, and root ordering
// =============================================================================

#[test]
fn test_aconfig_value_sets_accumulate_and_dedupe() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.release_with("base", &[], "aconfig_value_sets = [\"vs_a\", \"vs_b\"]\n")
        .release_with("r", &["base"], "aconfig_value_sets = [\"vs_b\"]\n");
    let d1 = tree.root("d1");
    d1.release_with("r", &[], "aconfig_value_sets = [\"vs_c\"]\n");

    let configs = resolve(&[d0.map_path(), d1.map_path()], "r").unwrap();
    let r = &configs.artifact().unwrap().release_config;
    assert_eq!(r.aconfig_value_sets, vec!["vs_a", "vs_b", "vs_c"]);
    assert_eq!(
        r.value_of("RELEASE_ACONFIG_VALUE_SETS"),
        Some(&Value::string("vs_a vs_b vs_c"))
    );
}

#[test]
fn test_allow_missing_falls_back_to_trunk_staging() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.flag("FOO", "off")
        .release("trunk_staging", &[])
        .value("trunk_staging", "FOO", "staged");

    let err = resolve(&[d0.map_path()], "nope").unwrap_err();
    assert!(matches!(err, ReleaseConfigError::UnknownRelease { .. }));

    let configs =
        ReleaseConfigs::read_release_config_maps(&[d0.map_path()], "nope", true).unwrap();
    let target = &configs.artifact().unwrap().release_config;
    assert_eq!(target.name, "trunk_staging");
    assert_eq!(target.value_of("FOO"), Some(&Value::string("staged")));
}

#[test]
fn test_repeated_root_loads_once() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.flag("FOO", "off").release("r", &[]);

    let configs = resolve(&[d0.map_path(), d0.dir.clone(), d0.map_path()], "r").unwrap();
    assert_eq!(configs.config_maps().len(), 1);
    assert_eq!(configs.dir_index().len(), 1);
}

#[test]
fn test_no_maps() {
    let err = resolve(&[], "r").unwrap_err();
    assert!(matches!(err, ReleaseConfigError::NoMapsFound));
}

#[test]
fn test_flag_value_directory_picks_highest_root() {
    let tree = Tree::new();
    let d0 = tree.root("d0");
    d0.flag("FOO", "off").flag("BAR", "off").release("r", &[]);
    let d1 = tree.root("d1");
    d1.release("r", &[]).value("r", "BAR", "on");

    let configs = resolve(&[d0.map_path(), d1.map_path()], "r").unwrap();
    assert_eq!(configs.flag_value_directory("r", "FOO").unwrap(), d0.dir.as_path());
    assert_eq!(configs.flag_value_directory("r", "BAR").unwrap(), d1.dir.as_path());
}
