//! Lua PulseAudio - Module Table and Registration
//!
//! This module exposes the mixer to Lua scripts:
//!
//! ```lua
//! local pulseaudio = require "pulseaudio"
//! for index, sink in pairs(pulseaudio.get_sinks()) do ... end
//! pulseaudio.set_sink_volume(0, { volume = 40, mute = false })
//! pulseaudio.move_sink_input(5, 2)
//! pulseaudio.set_default_sink("alsa_output.pci-0000_00_1f.3.analog-stereo")
//! ```

mod commands;
mod convert;
mod logging;

use mlua::{Lua, Result as LuaResult, Table, Value};
use pulse_mixer::{Connector, Target};
use tracing::debug;

/// Build the module table with every command bound to `connector`
pub fn create_module<C>(lua: &Lua, connector: C) -> LuaResult<Table>
where
    C: Connector + Clone + 'static,
{
    logging::init();
    debug!("Registering pulseaudio module");

    let module = lua.create_table()?;

    let c = connector.clone();
    module.set(
        "get_sinks",
        lua.create_function(move |lua, ()| commands::get_sinks(lua, &c))?,
    )?;

    let c = connector.clone();
    module.set(
        "get_sink_inputs",
        lua.create_function(move |lua, ()| commands::get_sink_inputs(lua, &c))?,
    )?;

    let c = connector.clone();
    module.set(
        "set_sink_volume",
        lua.create_function(move |_, (index, request): (Value, Value)| {
            commands::set_volume(&c, Target::Sink, index, request)
        })?,
    )?;

    let c = connector.clone();
    module.set(
        "set_sink_input_volume",
        lua.create_function(move |_, (index, request): (Value, Value)| {
            commands::set_volume(&c, Target::SinkInput, index, request)
        })?,
    )?;

    let c = connector.clone();
    module.set(
        "move_sink_input",
        lua.create_function(move |_, (sink_input, sink): (Value, Value)| {
            commands::move_sink_input(&c, sink_input, sink)
        })?,
    )?;

    let c = connector;
    module.set(
        "set_default_sink",
        lua.create_function(move |_, name: Value| commands::set_default_sink(&c, name))?,
    )?;

    Ok(module)
}

/// Entry point for `require "pulseaudio"` (exports `luaopen_pulseaudio`)
#[cfg(feature = "module")]
#[mlua::lua_module]
fn pulseaudio(lua: &Lua) -> LuaResult<Table> {
    create_module(lua, pulse_mixer::get_connector())
}
