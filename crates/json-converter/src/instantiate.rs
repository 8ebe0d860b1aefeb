//! Class instantiation and registered function invocation.
//!
//! The only place where registry closures with side effects are called.

use crate::configuration::Configuration;
use crate::error::ConvertError;
use crate::value::{Converted, Instance, Props};
use tracing::{trace, warn};

/// Builds an instance of the class registered as `type_name` from already
/// converted props.
///
/// Unregistered types fail with [`ConvertError::ClassNotFound`] unless the
/// configured [`UnregisteredClassPolicy`](crate::UnregisteredClassPolicy)
/// permits them, in which case they become `Converted::Null`.
pub fn instantiate_class(type_name: &str, props: Props, configuration: &Configuration) -> Result<Converted, ConvertError> {
    let Some(factory) = configuration.classes.get(type_name) else {
        if configuration.unregistered_classes.permits(type_name) {
            warn!(type_name, "no registered class, converting to null");
            return Ok(Converted::Null);
        }
        return Err(ConvertError::ClassNotFound(type_name.to_string()));
    };

    let props = (configuration.pre_process_class)(type_name, props);
    trace!(type_name, fields = props.len(), "instantiating class");
    let object = factory(&props)?;
    let instance = (configuration.post_process_class)(Instance::from_arc(type_name, object), &props);
    Ok(Converted::Instance(instance))
}

/// Calls the function registered as `name` with converted props.
pub fn invoke_function(name: &str, props: &Props, configuration: &Configuration) -> Result<Converted, ConvertError> {
    let function = configuration
        .functions
        .get(name)
        .ok_or_else(|| ConvertError::FunctionNotFound(name.to_string()))?;
    trace!(function = name, fields = props.len(), "invoking function");
    function(props)
}
