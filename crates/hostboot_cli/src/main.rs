//! CLI smoke entry point.
//!
//! # Responsibility
//! - Run one bootstrap sequence against an in-memory host to verify `hostboot_core` wiring.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Flags come from `HOSTBOOT_DEBUG` / `HOSTBOOT_ISOLATED`; set `HOSTBOOT_LOG_DIR` to
//! also write the rolling log file.

use hostboot_core::injector::{self, PATH_FIELD};
use hostboot_core::{lifecycle, settings};
use hostboot_core::{
    AdditionsLedger, BootstrapDriver, ContainerType, ExtensionPath, HostContainer, HostRejection,
    LifecyclePhase, ModuleInjector, PathSink, PrivilegeSource, PrivilegedAccessor, ResolveError,
    ResolveResult, ResolvedUnit,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};

const CONTAINER: &str = "smoke.MemoryContainer";

struct AlwaysGranted;

impl PrivilegeSource for AlwaysGranted {
    fn name(&self) -> &str {
        "smoke"
    }

    fn unlock(&self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Default)]
struct MemorySearchPath {
    paths: Mutex<Vec<PathBuf>>,
}

impl PathSink for MemorySearchPath {
    fn type_name(&self) -> &str {
        "smoke.MemorySearchPath"
    }

    fn extend(&self, _access: &PrivilegedAccessor, path: &Path) -> Result<(), HostRejection> {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_path_buf());
        Ok(())
    }
}

struct MemoryHost {
    ty: ContainerType,
    search_path: MemorySearchPath,
}

impl HostContainer for MemoryHost {
    fn container_type(&self) -> &ContainerType {
        &self.ty
    }

    fn field(&self, declaring_type: &str, field: &str) -> Option<&dyn PathSink> {
        (declaring_type == CONTAINER && field == PATH_FIELD)
            .then_some(&self.search_path as &dyn PathSink)
    }

    fn resolve(&self, name: &str, initialize: bool) -> ResolveResult<ResolvedUnit> {
        let paths = self
            .search_path
            .paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // A unit resolves once any location was injected.
        match paths.first() {
            Some(origin) => Ok(ResolvedUnit {
                name: name.to_string(),
                origin: Some(origin.clone()),
                initialized: initialize,
            }),
            None => Err(ResolveError::NotFound {
                name: name.to_string(),
                namespace: CONTAINER.to_string(),
            }),
        }
    }
}

fn main() -> ExitCode {
    let settings = match settings::current() {
        Ok(settings) => *settings,
        Err(err) => {
            eprintln!("hostboot settings error={err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(log_dir) = std::env::var_os("HOSTBOOT_LOG_DIR") {
        if let Err(err) = hostboot_core::init_logging_for(&settings, Path::new(&log_dir)) {
            eprintln!("hostboot logging error={err}");
        }
    }

    let host = Arc::new(MemoryHost {
        ty: ContainerType::root(CONTAINER).with_field(PATH_FIELD),
        search_path: MemorySearchPath::default(),
    });
    let installed = injector::install_global(ModuleInjector::new(
        host,
        injector::acquire_process_accessor(&AlwaysGranted),
        &settings,
    ));
    let injector = match installed {
        Ok(injector) => injector,
        Err(err) => {
            eprintln!("hostboot injector error={err}");
            return ExitCode::FAILURE;
        }
    };
    let ledger = Arc::new(AdditionsLedger::new());
    injector.register_callback(ledger.clone());

    let orchestrator = lifecycle::global();
    for phase in LifecyclePhase::ALL.into_iter().skip(1) {
        let registered = orchestrator.register_task(phase, 0, move || {
            log::info!("event=smoke_task module=cli status=ok phase={phase}");
            Ok(())
        });
        if let Err(err) = registered {
            eprintln!("hostboot register error={err}");
            return ExitCode::FAILURE;
        }
    }

    let paths = match ExtensionPath::new("/smoke/libs/runtime.bin") {
        Ok(path) => vec![path.isolated(settings.isolated_mode)],
        Err(err) => {
            eprintln!("hostboot path error={err}");
            return ExitCode::FAILURE;
        }
    };
    let mut driver = BootstrapDriver::new(injector, orchestrator);
    if !settings.isolated_mode {
        driver = driver.require_symbol("smoke.Runtime");
    }
    let sequence = driver
        .attach(&paths)
        .and_then(|_| driver.construct())
        .and_then(|_| driver.load())
        .and_then(|_| driver.enable())
        .and_then(|schedule| {
            if schedule {
                driver.activate()?;
            }
            driver.disable()
        });

    println!("hostboot_core version={}", hostboot_core::core_version());
    println!("hostboot shape={}", injector.host_shape());
    println!("hostboot injected={}", ledger.entries().len());
    println!("hostboot phase={}", orchestrator.current_phase());
    match sequence {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("hostboot bootstrap error={err}");
            ExitCode::FAILURE
        }
    }
}
