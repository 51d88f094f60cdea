//! Scripting collaborator.
//!
//! The core touches the scripting engine through two narrow calls: sector
//! trigger execution and entity activation callbacks. The [`Scripting`]
//! trait captures that surface; [`LuaScriptHost`] (feature `lua`) binds it to
//! the global Lua entry points, and [`NullScriptHost`] is the inert default
//! used when no script runtime is attached.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivatorKind {
    Player,
    Misc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    Activate,
    Deactivate,
}

pub trait Scripting {
    /// Run the trigger bound to a sector. Returns the script's integer
    /// result (0 when no trigger function is bound).
    fn run_trigger(&mut self, trigger_index: u32, activator: ActivatorKind, entity_id: u32) -> i32;

    /// Invoke the per-entity activation callback.
    fn entity_callback(&mut self, activator_id: u32, target_id: u32, kind: CallbackKind);
}

/// Default host: accepts every call and does nothing.
#[derive(Debug, Default)]
pub struct NullScriptHost;

impl Scripting for NullScriptHost {
    fn run_trigger(&mut self, _trigger_index: u32, _activator: ActivatorKind, _entity_id: u32) -> i32 {
        0
    }

    fn entity_callback(&mut self, _activator_id: u32, _target_id: u32, _kind: CallbackKind) {}
}

/// Wraps whichever host the application installed.
///
/// This is a `NonSend` resource because the Lua state is not thread-safe.
pub struct ScriptBridge {
    host: Box<dyn Scripting>,
}

impl Default for ScriptBridge {
    fn default() -> Self {
        Self {
            host: Box::new(NullScriptHost),
        }
    }
}

impl ScriptBridge {
    pub fn new(host: Box<dyn Scripting>) -> Self {
        Self { host }
    }

    pub fn host_mut(&mut self) -> &mut dyn Scripting {
        self.host.as_mut()
    }
}

#[cfg(feature = "lua")]
pub use lua_host::LuaScriptHost;

#[cfg(feature = "lua")]
mod lua_host {
    use super::{ActivatorKind, CallbackKind, Scripting};
    use log::error;
    use mlua::prelude::*;

    /// Names of the global Lua entry points the core calls into.
    const TRIGGER_FN: &str = "tlist_RunTrigger";
    const CALLBACK_FN: &str = "execEntity";

    /// Scripting host backed by an embedded Lua state. Script errors are
    /// logged and swallowed; a broken trigger must not stop the simulation.
    pub struct LuaScriptHost {
        lua: Lua,
    }

    impl LuaScriptHost {
        pub fn new(lua: Lua) -> Self {
            Self { lua }
        }

        pub fn lua(&self) -> &Lua {
            &self.lua
        }
    }

    impl Scripting for LuaScriptHost {
        fn run_trigger(
            &mut self,
            trigger_index: u32,
            activator: ActivatorKind,
            entity_id: u32,
        ) -> i32 {
            let Ok(func) = self.lua.globals().get::<LuaFunction>(TRIGGER_FN) else {
                return 0;
            };
            let activator = match activator {
                ActivatorKind::Player => 0,
                ActivatorKind::Misc => 1,
            };
            match func.call::<i32>((trigger_index, activator, entity_id)) {
                Ok(result) => result,
                Err(e) => {
                    error!(target: "lua", "Error in {}(): {}", TRIGGER_FN, e);
                    0
                }
            }
        }

        fn entity_callback(&mut self, activator_id: u32, target_id: u32, kind: CallbackKind) {
            let Ok(func) = self.lua.globals().get::<LuaFunction>(CALLBACK_FN) else {
                return;
            };
            let kind = match kind {
                CallbackKind::Activate => 0,
                CallbackKind::Deactivate => 1,
            };
            if let Err(e) = func.call::<()>((activator_id, target_id, kind)) {
                error!(target: "lua", "Error in {}(): {}", CALLBACK_FN, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_host_accepts_everything() {
        let mut bridge = ScriptBridge::default();
        assert_eq!(
            bridge.host_mut().run_trigger(3, ActivatorKind::Misc, 17),
            0
        );
        bridge
            .host_mut()
            .entity_callback(1, 2, CallbackKind::Activate);
    }

    #[cfg(feature = "lua")]
    #[test]
    fn lua_host_calls_global_trigger() {
        let lua = mlua::Lua::new();
        lua.load(
            r#"
            calls = {}
            function tlist_RunTrigger(index, activator, id)
                table.insert(calls, { index, activator, id })
                return 7
            end
            "#,
        )
        .exec()
        .unwrap();
        let mut host = LuaScriptHost::new(lua);
        assert_eq!(host.run_trigger(12, ActivatorKind::Player, 5), 7);
        // Missing callback function is not an error.
        host.entity_callback(1, 2, CallbackKind::Activate);
    }
}
