//! Shared helpers for the behavioral specs.

use modforge_core::{ComponentPlan, ComponentState, Config, FakeClock, ModuleRequest, RebuildStrategy};
use modforge_engine::{begin_build, submit, ComponentEvent, DefaultPolicy, Progress};
use modforge_storage::{RecordingNotifier, Store};

pub fn modulemd(name: &str, stream: &str, version: u64) -> String {
    format!(
        r#"{{
            "data": {{
                "name": "{name}",
                "stream": "{stream}",
                "version": {version},
                "xmd": {{"mbs": {{"buildrequires": {{
                    "platform": {{"stream": "f32", "version": "5", "context": "00000000"}}
                }}}}}},
                "dependencies": [{{"requires": {{"platform": ["f32"]}}}}]
            }}
        }}"#
    )
}

pub fn request(name: &str, stream: &str, version: u64) -> ModuleRequest {
    ModuleRequest {
        name: name.to_string(),
        stream: stream.to_string(),
        version: version.to_string(),
        modulemd: modulemd(name, stream, version),
        scmurl: Some(format!("https://src.example.com/modules/{name}")),
        owner: "mprahl".to_string(),
        rebuild_strategy: RebuildStrategy::All,
        scratch: false,
        srpms: Vec::new(),
    }
}

pub fn plan(package: &str, batch: u32) -> ComponentPlan {
    ComponentPlan {
        package: package.to_string(),
        scmurl: format!("https://src.example.com/rpms/{package}"),
        format: "rpms".to_string(),
        batch,
        scm_ref: None,
        buildonly: false,
        build_time_only: false,
        weight: 1.0,
    }
}

/// Submit a module and start building it with the given batch plan.
pub fn submit_and_start(
    store: &Store,
    notifier: &RecordingNotifier,
    clock: &FakeClock,
    req: ModuleRequest,
    plans: Vec<ComponentPlan>,
) -> u64 {
    let config = Config::default();
    let id = submit(store, notifier, &config, clock, req).expect("submit");
    begin_build(store, notifier, clock, id, plans).expect("begin_build");
    id
}

pub fn deliver(
    store: &Store,
    notifier: &RecordingNotifier,
    clock: &FakeClock,
    module_id: u64,
    task_id: u64,
    package: &str,
    state: ComponentState,
) -> Progress {
    let policy = DefaultPolicy::new(true);
    let event = ComponentEvent {
        task_id,
        package: package.to_string(),
        state,
        nvr: (state == ComponentState::Complete).then(|| format!("{package}-1.0-1.fc32")),
        reason: (state != ComponentState::Complete).then(|| "build error".to_string()),
    };
    modforge_engine::on_component_event(store, notifier, &policy, clock, module_id, &event)
        .expect("component event")
}
