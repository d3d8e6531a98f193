use particle_fx::config::CompilerConfig;
use particle_fx::particles::{
    resolve, validate, DiagnosticKind, Expression, NodePath, Operator, ResolvedSystem, System,
};
use particle_fx::render::shader::{generate, Emitter, ShaderGenerator, ShaderTemplates};
use particle_fx::{CompileError, EditEvent, ParticleEffectSession, SessionState};
use serde_json::json;

fn system(value: serde_json::Value) -> System {
    serde_json::from_value(value).unwrap()
}

fn emit(resolved: &ResolvedSystem, name: &str) -> String {
    let config = CompilerConfig::default();
    let identifier = resolved.identifier(name).unwrap();
    let expression = resolved.system().variables.get(identifier).unwrap();
    Emitter::new(&config.shader)
        .expression(expression)
        .unwrap()
        .to_string()
}

#[test]
fn test_addition_scenario() {
    let system = system(json!({
        "variables": {
            "sum": { "function": "addition", "parameters": [{ "value": 1 }, { "value": 2 }] }
        }
    }));
    assert!(validate(&system).is_empty());
    assert_eq!(emit(&resolve(&system).unwrap(), "sum"), "(1.0 + 2.0)");
}

#[test]
fn test_modulo_with_predefined_scenario() {
    let system = system(json!({
        "variables": {
            "phase": {
                "function": "modulo",
                "parameters": [{ "value": "time" }, { "value": "size" }, { "value": 1 }]
            }
        }
    }));
    assert!(validate(&system).is_empty());
    assert_eq!(
        emit(&resolve(&system).unwrap(), "phase"),
        "mod(mod(u_fParticleSystemTime, u_fParticleSystemSize), 1.0)"
    );
}

#[test]
fn test_declaration_order_scenario() {
    let ordered = system(json!({
        "variables": { "a": { "value": 1 }, "b": { "value": "a" } }
    }));
    assert!(validate(&ordered).is_empty());

    let reversed = system(json!({
        "variables": { "a": { "value": "b" }, "b": { "value": 1 } }
    }));
    let diagnostics = validate(&reversed);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::Ordering);
    assert_eq!(
        diagnostics[0].message,
        "variable \"b\" is used before its declaration"
    );
    assert_eq!(diagnostics[0].path, NodePath::variable("a"));
}

#[test]
fn test_single_scale_scenario() -> anyhow::Result<()> {
    let system = system(json!({
        "mtxLocal": [{ "transformation": "scale", "x": { "value": 2 } }]
    }));
    let sources = generate(&resolve(&system)?)?;
    assert!(sources.vertex.contains(
        "mat4 mtxLocal = mat4(2.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0);"
    ));
    assert!(!sources.vertex.contains(") * mat4("));
    assert!(sources
        .vertex
        .contains("mat4 mtxMeshToWorld = u_mtxMeshToWorld * mtxLocal;"));
    Ok(())
}

#[test]
fn test_reserved_name_scenario() {
    let system = system(json!({ "variables": { "time": { "value": 1 } } }));
    assert_eq!(
        resolve(&system),
        Err(CompileError::ReservedName {
            name: "time".to_string()
        })
    );

    let mut session = ParticleEffectSession::new(&CompilerConfig::default())
        .unwrap()
        .with_system(system);
    assert_eq!(
        session.apply(EditEvent::Add(NodePath::variable("time"))),
        SessionState::Invalid
    );
    assert!(session.committed().is_none());
    assert_eq!(session.diagnostics()[0].kind, DiagnosticKind::ReservedName);
}

#[test]
fn test_power_extra_parameter_scenario() {
    let system = system(json!({
        "variables": {
            "p": {
                "function": "power",
                "parameters": [{ "value": 2 }, { "value": 3 }, { "value": 4 }]
            }
        }
    }));
    assert!(validate(&system).is_empty());
    assert_eq!(emit(&resolve(&system).unwrap(), "p"), "pow(2.0, 3.0)");
}

#[test]
fn test_session_end_to_end() -> anyhow::Result<()> {
    let mut session = ParticleEffectSession::new(&CompilerConfig::default())?.with_system(system(
        json!({
            "variables": {
                "angle": {
                    "function": "multiplication",
                    "parameters": [{ "value": "time" }, { "value": 90 }]
                },
                "jitter": {
                    "function": "randomRange",
                    "parameters": [{ "value": "index" }, { "value": -1 }, { "value": 1 }]
                }
            },
            "mtxLocal": [
                { "transformation": "translate", "y": { "value": "jitter" } },
                { "transformation": "rotate", "z": { "value": "angle" } }
            ],
            "mtxWorld": [{ "transformation": "scale", "x": { "value": "size" } }],
            "color": { "a": { "value": 0.5 } }
        }),
    ));

    assert_eq!(session.apply(EditEvent::Paste(NodePath::root())), SessionState::Committed);
    let effect = session.committed().expect("committed effect");
    let vertex = &effect.sources().vertex;
    assert!(vertex.starts_with("#version 300 es\n#define PARTICLE\n#define PARTICLE_COLOR\n"));
    assert!(vertex.contains("float var0 = (u_fParticleSystemTime * 90.0);"));
    assert!(vertex.contains("float fRadZLocal1 = radians(var0);"));
    assert!(vertex.contains("mat4 mtxMeshToWorld = mtxWorld * u_mtxMeshToWorld * mtxLocal;"));
    assert!(vertex.contains("v_vctColor = vec4(1.0, 1.0, 1.0, 0.5);"));
    assert!(effect.sources().fragment.contains("vctFrag *= v_vctColor;"));

    // 用户看到的名字保持不变
    assert!(effect.system().variables.contains("angle"));

    // 无效编辑保留上一次的提交
    let key = effect.key().clone();
    session
        .working_mut()
        .variables
        .insert("broken", Expression::call(Operator::SquareRoot, vec![]));
    assert_eq!(
        session.apply(EditEvent::Add(NodePath::variable("broken"))),
        SessionState::Invalid
    );
    assert_eq!(session.committed().map(|e| e.key()), Some(&key));
    assert_eq!(
        session.diagnostics()[0].to_string(),
        "variables/broken/squareRoot needs at least 1 parameters"
    );
    Ok(())
}

#[test]
fn test_custom_templates() -> anyhow::Result<()> {
    let vertex = "/*$header*/\nvoid main() {\n  /*$variables*/\n  /*$mtxLocal*/\n  /*$mtxWorld*/\n  \
                  gl_Position = /*$applyMtxWorld*/u_mtx/*$applyMtxLocal*/ * vec4(0.0);\n  \
                  v_color = /*$color*/;\n}\n";
    let templates = ShaderTemplates::new(vertex, "/*$header*/\nvoid main() {}\n")?;
    let config = CompilerConfig::default();
    let generator = ShaderGenerator::with_templates(config.shader.clone(), templates);

    let system = system(json!({ "variables": { "a": { "value": 3 } } }));
    let sources = generator.generate(&resolve(&system)?)?;
    assert_eq!(
        sources.vertex,
        "#version 300 es\n#define PARTICLE\nvoid main() {\n  float var0 = 3.0;\n  \n  \n  \
         gl_Position = u_mtx * vec4(0.0);\n  v_color = ;\n}\n"
    );
    assert_eq!(sources.fragment, "#version 300 es\n#define PARTICLE\nvoid main() {}\n");
    Ok(())
}

#[test]
fn test_persisted_shape_round_trip() {
    let text = concat!(
        r#"{"variables":{"z":{"value":1.5},"a":{"function":"squareRoot","parameters":[{"value":"z"}]}},"#,
        r#""mtxWorld":[{"transformation":"rotate","y":{"value":45.0}}],"#,
        r#""color":{"r":{"value":"a"}}}"#
    );
    let system: System = serde_json::from_str(text).unwrap();
    assert_eq!(system.variables.names().collect::<Vec<_>>(), vec!["z", "a"]);
    assert!(validate(&system).is_empty());
    assert_eq!(serde_json::to_string(&system).unwrap(), text);
}

#[test]
fn test_declaration_order_survives_every_serde_path() -> anyhow::Result<()> {
    let text = r#"{"variables":{"speed":{"value":2.0},"offset":{"value":"speed"}}}"#;
    let expected = vec!["speed", "offset"];

    let parsed: System = serde_json::from_str(text)?;
    let from_value = system(serde_json::from_str::<serde_json::Value>(text)?);
    let literal = system(json!({
        "variables": { "speed": { "value": 2 }, "offset": { "value": "speed" } }
    }));
    let round_trip: System = serde_json::from_value(serde_json::to_value(&parsed)?)?;

    for system in [&parsed, &from_value, &literal, &round_trip] {
        assert_eq!(system.variables.names().collect::<Vec<_>>(), expected);
        assert!(validate(system).is_empty());
    }
    assert_eq!(serde_json::to_string(&round_trip)?, text);
    Ok(())
}
