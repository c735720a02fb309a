//! Model documents, manifests and constant expansion on disk.

use std::fs;

use approx::assert_abs_diff_eq;
use lp_app::{
    AppError, ExpansionInputs, Manifest, expand_constant_files, load_model, merge_manifest,
    merge_manifest_file, open_model, save_model,
};
use lp_model::{LoopKind, ModelError, PdArgs};
use tempfile::TempDir;

const PLANT: &str = r#"{ "num": [1], "den": ["tau", 1] }"#;
const CONTROLLER: &str = r#"{ "num": ["Kp"], "den": [1] }"#;

fn write(dir: &TempDir, rel: &str, text: &str) {
    let path = dir.path().join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn model_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "plants/lag.json", PLANT);
    write(&tmp, "controllers/p.json", CONTROLLER);
    write(&tmp, "constants/base.json", r#"{ "tau": 2.0, "Kp": 1.0 }"#);
    write(&tmp, "constants/tuned.yaml", "Kp: \"tau * 1.5\"\n");
    tmp
}

#[test]
fn merge_later_constants_win() {
    let tmp = model_tree();
    let manifest = Manifest {
        plants: vec!["lag.json".into()],
        controllers: vec!["p.json".into()],
        constants: vec!["base.json".into(), "tuned.yaml".into()],
        pd_args: Some(PdArgs {
            phase_margin_deg: 60.0,
            integral_gain: 0.1,
            crossover_rad_s: 4.0,
        }),
    };
    let def = merge_manifest(tmp.path(), &manifest).unwrap();
    assert_eq!(def.plants.len(), 1);
    assert_eq!(def.controllers.len(), 1);
    assert!(def.pd_args.is_some());

    let model = lp_model::LoopModel::new(def).unwrap();
    assert_eq!(model.constants().get("Kp"), Some(3.0));

    // L = 3 / (2s + 1)
    let l = model.select(LoopKind::Ls).unwrap();
    assert_eq!(l.coefficients(), (vec![3.0], vec![2.0, 1.0]));
}

#[test]
fn merged_model_round_trips_through_yaml() {
    let tmp = model_tree();
    write(
        &tmp,
        "manifest.json",
        r#"{ "plants": ["lag.json"], "controllers": ["p.json"], "constants": ["base.json"] }"#,
    );
    let def = merge_manifest_file(tmp.path(), &tmp.path().join("manifest.json")).unwrap();

    let out = tmp.path().join("merged.yaml");
    save_model(&out, &def).unwrap();
    assert_eq!(load_model(&out).unwrap(), def);

    let model = open_model(&out).unwrap();
    let w = model.select(LoopKind::Ws).unwrap();
    assert_abs_diff_eq!(w.dc_gain(), 0.5, epsilon = 1e-12);
}

#[test]
fn missing_block_file_is_fatal() {
    let tmp = model_tree();
    let manifest = Manifest {
        plants: vec!["absent.json".into()],
        ..Manifest::default()
    };
    let err = merge_manifest(tmp.path(), &manifest).unwrap_err();
    assert!(matches!(err, AppError::FileRead { .. }));
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn unresolvable_constants_surface_as_model_errors() {
    let tmp = TempDir::new().unwrap();
    write(
        &tmp,
        "model.json",
        r#"{ "constants": { "a": "b + 1", "b": "a * 2" },
             "controllers": [], "plants": [ { "num": [1], "den": ["a", 1] } ] }"#,
    );
    let err = open_model(&tmp.path().join("model.json")).unwrap_err();
    assert!(matches!(
        err,
        AppError::Model(ModelError::CircularOrUndefinedConstant { .. })
    ));
}

#[test]
fn expansion_from_files() {
    let tmp = TempDir::new().unwrap();
    write(&tmp, "params.txt", "# gains\nPOS_P 1.5\n\nPOS_I 0.25\n");
    write(
        &tmp,
        "drone.json",
        r#"{ "body": { "mass": 0.8, "arms": [0.1, 0.12] } }"#,
    );
    write(
        &tmp,
        "expand.json",
        r#"{
            "Kp": "param:POS_P",
            "Ki": "config_pid:POS_I",
            "m": "json:body.mass",
            "arm": "config_drone:body.arms[1]",
            "g": "value:9.81",
            "weight": "calc:m * g"
        }"#,
    );

    let out = expand_constant_files(&ExpansionInputs {
        params: tmp.path().join("params.txt"),
        document: tmp.path().join("drone.json"),
        config: tmp.path().join("expand.json"),
    })
    .unwrap();

    assert_eq!(out["Kp"], 1.5);
    assert_eq!(out["Ki"], 0.25);
    assert_eq!(out["arm"], 0.12);
    assert_abs_diff_eq!(out["weight"], 0.8 * 9.81, epsilon = 1e-12);
}
