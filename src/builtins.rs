use crate::value::{Builtin, Value};

/// Resolves a name to its intrinsic function. Consulted only after the
/// environment chain misses, so user bindings shadow builtins.
pub fn lookup(name: &str) -> Option<Builtin> {
    match name {
        "len" => Some(Builtin {
            name: "len",
            func: builtin_len,
        }),
        "first" => Some(Builtin {
            name: "first",
            func: builtin_first,
        }),
        "last" => Some(Builtin {
            name: "last",
            func: builtin_last,
        }),
        "rest" => Some(Builtin {
            name: "rest",
            func: builtin_rest,
        }),
        "push" => Some(Builtin {
            name: "push",
            func: builtin_push,
        }),
        "puts" => Some(Builtin {
            name: "puts",
            func: builtin_puts,
        }),
        _ => None,
    }
}

fn check_arg_count(name: &str, args: &[Value], expected: usize) -> Result<(), String> {
    if args.len() != expected {
        Err(format!(
            "`{}` received wrong number of arguments. expected {}, got {}",
            name,
            expected,
            args.len()
        ))
    } else {
        Ok(())
    }
}

fn arg_type_error(name: &str, arg: &Value) -> String {
    format!("`{}` argument of type {} not supported", name, arg.type_name())
}

fn builtin_len(args: &[Value]) -> Result<Value, String> {
    check_arg_count("len", args, 1)?;
    match &args[0] {
        Value::String(value) => Ok(Value::Integer(value.len() as i64)),
        Value::Array(elements) => Ok(Value::Integer(elements.len() as i64)),
        other => Err(arg_type_error("len", other)),
    }
}

fn builtin_first(args: &[Value]) -> Result<Value, String> {
    check_arg_count("first", args, 1)?;
    match &args[0] {
        Value::Array(elements) => Ok(elements.first().cloned().unwrap_or(Value::Null)),
        other => Err(arg_type_error("first", other)),
    }
}

fn builtin_last(args: &[Value]) -> Result<Value, String> {
    check_arg_count("last", args, 1)?;
    match &args[0] {
        Value::Array(elements) => Ok(elements.last().cloned().unwrap_or(Value::Null)),
        other => Err(arg_type_error("last", other)),
    }
}

fn builtin_rest(args: &[Value]) -> Result<Value, String> {
    check_arg_count("rest", args, 1)?;
    match &args[0] {
        Value::Array(elements) => {
            if elements.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::Array(elements[1..].to_vec()))
            }
        }
        other => Err(arg_type_error("rest", other)),
    }
}

fn builtin_push(args: &[Value]) -> Result<Value, String> {
    check_arg_count("push", args, 2)?;
    match &args[0] {
        Value::Array(elements) => {
            // Builds a fresh array; the argument stays observably unchanged
            let mut extended = Vec::with_capacity(elements.len() + 1);
            extended.extend_from_slice(elements);
            extended.push(args[1].clone());
            Ok(Value::Array(extended))
        }
        other => Err(arg_type_error("push", other)),
    }
}

fn builtin_puts(args: &[Value]) -> Result<Value, String> {
    for arg in args {
        println!("{}", arg);
    }
    Ok(Value::Null)
}
