//! Precedence scenarios through the public API

use clap::{Arg, ArgAction, Command};
use layercfg::{config_arg, ClapFlags, FlagDefaults, FlagSet, LoadError, MergeEngine, Phase, StaticEnv, CONFIG_FLAG};
use serde::{Deserialize, Serialize};
use similar_asserts::assert_eq;
use std::fs;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Nested {
    val: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TestConfig {
    value: i32,
    nested: Nested,
}

const DEFAULTS: TestConfig = TestConfig { value: -1, nested: Nested { val: -2 } };

fn engine() -> MergeEngine {
    MergeEngine::new("TEST_", ".").expect("engine")
}

fn command() -> Command {
    Command::new("prog")
        .arg(config_arg())
        .arg(Arg::new("value").long("value").value_parser(clap::value_parser!(i32)))
        .arg(Arg::new("nested.val").long("nested.val"))
}

struct Layers {
    file: bool,
    env: bool,
    flag: bool,
}

fn load(layers: Layers) -> TestConfig {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("app.yaml");
    fs::write(&path, "value: 1\n").expect("write");

    let mut args = vec!["prog".to_string()];
    if layers.file {
        args.push(format!("--config={}", path.display()));
    }
    if layers.flag {
        args.push("--value=3".to_string());
    }
    let env = if layers.env { StaticEnv::new().with("TEST_VALUE", "2") } else { StaticEnv::new() };

    let mut cmd = command();
    let matches = cmd.try_get_matches_from_mut(args).expect("parse");
    let mut cfg = DEFAULTS;
    engine().load_with_env(&ClapFlags::new(&cmd, &matches), &env, &mut cfg).expect("load");
    cfg
}

#[test]
fn each_layer_overrides_the_one_below() {
    assert_eq!(load(Layers { file: true, env: true, flag: true }).value, 3);
    assert_eq!(load(Layers { file: true, env: true, flag: false }).value, 2);
    assert_eq!(load(Layers { file: true, env: false, flag: false }).value, 1);
    assert_eq!(load(Layers { file: false, env: false, flag: false }), DEFAULTS);
}

#[test]
fn flag_beats_env_for_same_key() {
    assert_eq!(load(Layers { file: false, env: true, flag: true }).value, 3);
}

#[test]
fn untouched_nested_field_keeps_default() {
    let cfg = load(Layers { file: true, env: true, flag: true });
    assert_eq!(cfg.nested, DEFAULTS.nested);
}

#[test]
fn env_scenario_from_prefixed_names() {
    let env = StaticEnv::new().with("TEST_VALUE", "101").with("TEST_NESTED_VAL", "102");
    let mut cmd = Command::new("prog");
    let matches = cmd.try_get_matches_from_mut(["prog"]).expect("parse");
    let mut cfg = DEFAULTS;
    engine().load_with_env(&ClapFlags::new(&cmd, &matches), &env, &mut cfg).expect("load");
    assert_eq!(cfg, TestConfig { value: 101, nested: Nested { val: 102 } });
}

#[test]
fn nested_flag_names_use_the_delimiter() {
    let mut cmd = command();
    let matches = cmd.try_get_matches_from_mut(["prog", "--nested.val=7"]).expect("parse");
    let mut cfg = DEFAULTS;
    engine().load_with_env(&ClapFlags::new(&cmd, &matches), &StaticEnv::new(), &mut cfg).expect("load");
    assert_eq!(cfg.nested.val, 7);
}

#[test]
fn other_delimiters_apply_to_env_and_flags() {
    let engine = MergeEngine::new("APP_", "-").expect("engine");
    let env = StaticEnv::new().with("APP_VALUE", "5");
    let flags = {
        let mut flags = FlagSet::new().define("nested-val", 0i64);
        flags.set("nested-val", 6i64).expect("set");
        flags
    };
    let mut cfg = DEFAULTS;
    engine.load_with_env(&flags, &env, &mut cfg).expect("load");
    assert_eq!(cfg, TestConfig { value: 5, nested: Nested { val: 6 } });
}

#[test]
fn no_config_flag_still_applies_env_and_flags() {
    let flags = FlagSet::new().define("nested.val", 9i64);
    let env = StaticEnv::new().with("TEST_VALUE", "8");
    let mut cfg = DEFAULTS;
    engine().load_with_env(&flags, &env, &mut cfg).expect("load");
    assert_eq!(cfg, TestConfig { value: 8, nested: Nested { val: 9 } });
}

#[test]
fn malformed_file_fails_in_file_phase() {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("bad.yaml");
    fs::write(&path, "value: {unclosed\n").expect("write");

    let mut flags = FlagSet::new().define_list(CONFIG_FLAG);
    flags.set(CONFIG_FLAG, path.to_string_lossy().into_owned()).expect("set");
    let mut cfg = DEFAULTS;
    let err = engine().load_with_env(&flags, &StaticEnv::new(), &mut cfg).expect_err("should fail");
    assert!(matches!(err, LoadError::FileDecode { .. }), "{err}");
    assert_eq!(err.phase(), Phase::Files);
}

#[test]
fn bool_flags_and_env_strings_bind_to_bools() {
    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Switches {
        debug: bool,
        color: bool,
    }

    let mut cmd = Command::new("prog").arg(Arg::new("debug").long("debug").action(ArgAction::SetTrue));
    let matches = cmd.try_get_matches_from_mut(["prog", "--debug"]).expect("parse");
    let env = StaticEnv::new().with("TEST_COLOR", "true");
    let mut cfg = Switches::default();
    engine().load_with_env(&ClapFlags::new(&cmd, &matches), &env, &mut cfg).expect("load");
    assert_eq!(cfg, Switches { debug: true, color: true });
}

#[test]
fn unset_bool_flag_default_depends_on_policy() {
    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Switches {
        debug: bool,
    }

    let mut cmd = Command::new("prog").arg(Arg::new("debug").long("debug").action(ArgAction::SetTrue));
    let matches = cmd.try_get_matches_from_mut(["prog"]).expect("parse");
    let flags = ClapFlags::new(&cmd, &matches);
    let env = StaticEnv::new().with("TEST_DEBUG", "true");

    let mut cfg = Switches::default();
    engine().load_with_env(&flags, &env, &mut cfg).expect("load");
    assert_eq!(cfg, Switches { debug: false }, "override: the implicit false wins");

    let mut cfg = Switches::default();
    engine()
        .with_flag_defaults(FlagDefaults::FillMissing)
        .load_with_env(&flags, &env, &mut cfg)
        .expect("load");
    assert_eq!(cfg, Switches { debug: true }, "fill-missing: the environment wins");
}
