//! Lua Commands - Called from scripts via the `pulseaudio` module table
//!
//! Every command validates its arguments first, then opens one session,
//! issues its requests and closes the session before returning. Server
//! refusals come back as `false`; bad arguments and connection failures
//! raise Lua errors.

use mlua::{Error as LuaError, Lua, Result as LuaResult, Table, Value};
use pulse_mixer::{mixer, Connector, MixerBackend, MixerError, Target};
use tracing::{debug, error};

use crate::convert::{self, Arg};

/// Map a mixer error to a Lua error
fn lua_error(err: MixerError) -> LuaError {
    if err.is_connection_error() {
        error!("Failed to initialize PulseAudio: {}", err);
        LuaError::RuntimeError(format!("couldn't initialize pulseaudio: {}", err))
    } else {
        LuaError::RuntimeError(err.to_string())
    }
}

/// Open one session for the duration of a command
fn open<C: Connector>(connector: &C) -> LuaResult<C::Backend> {
    let session = connector.connect().map_err(lua_error)?;
    debug!("Opened {} session", session.name());
    Ok(session)
}

/// `get_sinks()` - sinks keyed by index and by name
pub fn get_sinks<C: Connector>(lua: &Lua, connector: &C) -> LuaResult<Table> {
    let sinks = {
        let mut session = open(connector)?;
        mixer::list_sinks(&mut session).map_err(lua_error)?
    };
    convert::sinks_table(lua, &sinks)
}

/// `get_sink_inputs()` - sink inputs keyed by index
pub fn get_sink_inputs<C: Connector>(lua: &Lua, connector: &C) -> LuaResult<Table> {
    let inputs = {
        let mut session = open(connector)?;
        mixer::list_sink_inputs(&mut session).map_err(lua_error)?
    };
    convert::sink_inputs_table(lua, &inputs)
}

/// `set_sink_volume(index, {mute=, volume=})` / `set_sink_input_volume(...)`
pub fn set_volume<C: Connector>(
    connector: &C,
    target: Target,
    index: Value,
    request: Value,
) -> LuaResult<bool> {
    let index = convert::index_arg(&index, Arg::First)?;
    let request = convert::volume_request_arg(&request, Arg::Second)?;

    let mut session = open(connector)?;
    mixer::set_volume(&mut session, target, index, &request).map_err(lua_error)
}

/// `move_sink_input(sink_input, sink)`
pub fn move_sink_input<C: Connector>(connector: &C, sink_input: Value, sink: Value) -> LuaResult<bool> {
    let sink_input = convert::index_arg(&sink_input, Arg::First)?;
    let sink = convert::index_arg(&sink, Arg::Second)?;

    let mut session = open(connector)?;
    mixer::move_sink_input(&mut session, sink_input, sink).map_err(lua_error)
}

/// `set_default_sink(name)`
pub fn set_default_sink<C: Connector>(connector: &C, name: Value) -> LuaResult<bool> {
    let name = convert::name_arg(&name, Arg::Only)?;

    let mut session = open(connector)?;
    mixer::set_default_sink(&mut session, &name).map_err(lua_error)
}
