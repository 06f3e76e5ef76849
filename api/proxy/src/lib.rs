use std::ffi::{CStr, CString, c_int, c_void};
use std::path::Path;
use std::ptr::null_mut;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tm_convert_api::*;
use tm_convert_proxy_sys as sys;

use anyhow::{Context as _, Result};

macro_rules! check {
    ($expr:expr) => {
        unsafe {
            let status = $expr;
            if status < 0 {
                Err(anyhow::anyhow!(
                    "tengine call returned {status} (errno {})",
                    sys::get_tengine_errno()
                ))
            } else {
                Ok(())
            }
        }
    };
}

fn c_path(path: &Path) -> Result<CString> {
    Ok(CString::new(
        path.to_str().with_context(|| format!("Failed to re-encode {path:?} to utf-8"))?,
    )?)
}

/// Live `Tengine` handles (graphs hold one each). The native context is
/// initialized when this leaves 0 and released when it comes back to 0.
static USERS: Mutex<usize> = Mutex::new(0);

fn users() -> MutexGuard<'static, usize> {
    USERS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle on the process-wide native library context. Every call returns a
/// handle on the same context while any handle or graph is still alive.
pub fn tengine() -> Result<Tengine> {
    let mut users = users();
    if *users == 0 {
        log::trace!("init tengine");
        check!(sys::init_tengine()).context("Failed to initialize tengine")?;
    }
    *users += 1;
    Ok(Tengine { _private: () })
}

#[derive(Debug)]
pub struct Tengine {
    _private: (),
}

impl Clone for Tengine {
    fn clone(&self) -> Tengine {
        *users() += 1;
        Tengine { _private: () }
    }
}

impl Drop for Tengine {
    fn drop(&mut self) {
        let mut users = users();
        *users -= 1;
        if *users == 0 {
            log::trace!("release tengine");
            unsafe {
                sys::release_tengine();
            }
        }
    }
}

impl EngineInterface for Tengine {
    type Graph = Graph;

    fn version(&self) -> Result<String> {
        unsafe {
            let ptr = sys::get_tengine_version();
            anyhow::ensure!(!ptr.is_null(), "tengine did not report a version");
            Ok(CStr::from_ptr(ptr).to_string_lossy().into_owned())
        }
    }

    fn load(&self, format: ModelFormat, sources: &ModelSources) -> Result<Graph> {
        let name = CString::new(format.name())?;
        let paths =
            sources.paths().into_iter().map(c_path).collect::<Result<Vec<CString>>>()?;
        let raw = match &*paths {
            [model] if format.input_count() == 1 => unsafe {
                sys::create_graph(null_mut(), name.as_ptr(), model.as_ptr())
            },
            [proto, model] if format.input_count() == 2 => unsafe {
                sys::create_graph(null_mut(), name.as_ptr(), proto.as_ptr(), model.as_ptr())
            },
            _ => anyhow::bail!(
                "{format} expects {} input file(s), got {}",
                format.input_count(),
                paths.len()
            ),
        };
        if raw.is_null() {
            anyhow::bail!("tengine could not build a graph (errno {})", unsafe {
                sys::get_tengine_errno()
            });
        }
        Ok(Graph { raw, _tengine: self.clone() })
    }
}

#[derive(Debug)]
pub struct Graph {
    raw: sys::graph_t,
    _tengine: Tengine,
}

impl Drop for Graph {
    fn drop(&mut self) {
        log::trace!("destroy graph");
        unsafe {
            sys::destroy_graph(self.raw);
        }
    }
}

impl GraphInterface for Graph {
    fn set_optimize_only(&mut self, optimize_only: bool) -> Result<()> {
        let attr = CString::new("optimize_only")?;
        let value = optimize_only as c_int;
        check!(sys::set_graph_attr(
            self.raw,
            attr.as_ptr(),
            &value as *const c_int as *const c_void,
            std::mem::size_of::<c_int>() as c_int,
        ))
    }

    fn prerun(&mut self) -> Result<()> {
        check!(sys::prerun_graph(self.raw))
    }

    fn save(&self, format: &str, path: impl AsRef<Path>) -> Result<()> {
        let format = CString::new(format)?;
        let path = c_path(path.as_ref())?;
        check!(sys::save_graph(self.raw, format.as_ptr(), path.as_ptr()))
    }
}
