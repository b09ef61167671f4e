mod common;

use common::{granted, FakeHost};
use hostboot_core::injector::{self, InjectorError};
use hostboot_core::lifecycle;
use hostboot_core::settings::{self, SettingsError};
use hostboot_core::{BootstrapSettings, ExtensionPath, LifecyclePhase, ModuleInjector, Registration};
use std::sync::Arc;

#[test]
fn injector_installs_once_per_process() {
    assert!(injector::global().is_none());
    let host = Arc::new(FakeHost::conventional());
    let first = ModuleInjector::new(host.clone(), Ok(granted()), &BootstrapSettings::default());

    let installed = injector::install_global(first).expect("first install");
    let global = injector::global().expect("installed injector");
    assert!(std::ptr::eq(installed, global));

    let second = ModuleInjector::new(host.clone(), Ok(granted()), &BootstrapSettings::default());
    assert!(matches!(
        injector::install_global(second),
        Err(InjectorError::AlreadyInstalled)
    ));

    let path = ExtensionPath::new("/opt/host/libs/core.bin").expect("absolute path");
    global.add_path(&path).expect("global injector extends the host");
    assert_eq!(host.search_path.paths().len(), 1);
}

#[test]
fn settings_install_once_and_current_returns_installed_value() {
    let chosen = BootstrapSettings {
        debug_mode: true,
        isolated_mode: false,
    };
    let installed = settings::install(chosen).expect("first install");
    assert_eq!(*installed, chosen);
    settings::install(chosen).expect("same value is accepted again");

    let other = BootstrapSettings {
        debug_mode: false,
        isolated_mode: true,
    };
    assert_eq!(
        settings::install(other),
        Err(SettingsError::AlreadyInstalled(chosen))
    );
    assert_eq!(*settings::current().expect("installed settings"), chosen);
}

#[test]
fn lifecycle_global_is_one_shared_orchestrator() {
    let orchestrator = lifecycle::global();
    assert!(std::ptr::eq(orchestrator, lifecycle::global()));

    let registration = orchestrator
        .register_task(LifecyclePhase::Disable, 0, || Ok(()))
        .expect("deferred registration");
    assert_eq!(registration, Registration::Deferred);
    assert_eq!(lifecycle::global().pending_count(LifecyclePhase::Disable), 1);
}
