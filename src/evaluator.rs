use crate::ast::{BinaryOp, Expr, Program, Stmt, UnaryOp};
use crate::builtins;
use crate::error::{EmberError, Span};
use crate::value::{Function, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A name-to-value map with an optional link to the enclosing environment.
/// Lookup walks inner to outer; `let` always binds in the innermost map.
/// Closures hold their defining environment alive through the `Rc` link.
#[derive(Debug)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Self {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(ref enclosing) = self.enclosing {
            enclosing.borrow().get(name)
        } else {
            None
        }
    }

    pub fn set(&mut self, name: String, value: Value) {
        self.values.insert(name, value);
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// Tree-walking evaluator. Owns the root environment so REPL lines share
/// bindings across evaluations.
pub struct Evaluator {
    environment: Rc<RefCell<Environment>>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            environment: Rc::new(RefCell::new(Environment::new())),
        }
    }

    /// Evaluates a program in the root environment. A pending `return` is
    /// unwrapped exactly once here; an empty program yields `null`.
    pub fn evaluate_program(&mut self, program: &Program) -> Result<Value, EmberError> {
        let env = Rc::clone(&self.environment);
        let mut result = Value::Null;
        for statement in &program.statements {
            match self.execute_statement(statement, &env)? {
                Value::Return(value) => return Ok(*value),
                value => result = value,
            }
        }
        Ok(result)
    }

    fn execute_statement(
        &self,
        statement: &Stmt,
        env: &Rc<RefCell<Environment>>,
    ) -> Result<Value, EmberError> {
        match statement {
            Stmt::Let { name, value, .. } => {
                let value = self.evaluate_expression(value, env)?;
                env.borrow_mut().set(name.clone(), value);
                Ok(Value::Null)
            }
            Stmt::Return { value, .. } => {
                let value = self.evaluate_expression(value, env)?;
                Ok(Value::Return(Box::new(value)))
            }
            Stmt::Expression { expr, .. } => self.evaluate_expression(expr, env),
            Stmt::Block { statements, .. } => self.execute_block(statements, env),
        }
    }

    fn execute_block(
        &self,
        statements: &[Stmt],
        env: &Rc<RefCell<Environment>>,
    ) -> Result<Value, EmberError> {
        let mut result = Value::Null;
        for statement in statements {
            let value = self.execute_statement(statement, env)?;
            // A pending return passes through blocks untouched; only the
            // program top level and the call boundary unwrap it
            if matches!(value, Value::Return(_)) {
                return Ok(value);
            }
            result = value;
        }
        Ok(result)
    }

    pub fn evaluate_expression(
        &self,
        expr: &Expr,
        env: &Rc<RefCell<Environment>>,
    ) -> Result<Value, EmberError> {
        match expr {
            Expr::Identifier { name, span } => self.evaluate_identifier(name, *span, env),
            Expr::IntegerLiteral { value, .. } => Ok(Value::Integer(*value)),
            Expr::BooleanLiteral { value, .. } => Ok(Value::Boolean(*value)),
            Expr::StringLiteral { value, .. } => Ok(Value::String(value.clone())),
            Expr::ArrayLiteral { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.evaluate_expression(element, env)?);
                }
                Ok(Value::Array(values))
            }
            Expr::HashLiteral { pairs, .. } => self.evaluate_hash_literal(pairs, env),
            Expr::Prefix {
                operator,
                operand,
                span,
            } => {
                let operand = self.evaluate_expression(operand, env)?;
                self.evaluate_prefix_op(*operator, operand, *span)
            }
            Expr::Infix {
                left,
                operator,
                right,
                span,
            } => {
                let left_value = self.evaluate_expression(left, env)?;
                let right_value = self.evaluate_expression(right, env)?;
                self.evaluate_binary_op(*operator, left_value, right_value, *span)
            }
            Expr::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                let condition = self.evaluate_expression(condition, env)?;
                if condition.is_truthy() {
                    self.execute_statement(consequence, env)
                } else if let Some(alternative) = alternative {
                    self.execute_statement(alternative, env)
                } else {
                    Ok(Value::Null)
                }
            }
            Expr::FunctionLiteral {
                parameters, body, ..
            } => Ok(Value::Function(Rc::new(Function {
                parameters: parameters.clone(),
                body: Rc::clone(body),
                env: Rc::clone(env),
            }))),
            Expr::Call {
                callee,
                arguments,
                span,
            } => {
                let callee_value = self.evaluate_expression(callee, env)?;
                let mut argument_values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    argument_values.push(self.evaluate_expression(argument, env)?);
                }
                self.evaluate_call(callee_value, argument_values, *span)
            }
            Expr::Index {
                target,
                index,
                span,
            } => {
                let target_value = self.evaluate_expression(target, env)?;
                let index_value = self.evaluate_expression(index, env)?;
                self.evaluate_index(target_value, index_value, *span)
            }
        }
    }

    fn evaluate_identifier(
        &self,
        name: &str,
        span: Span,
        env: &Rc<RefCell<Environment>>,
    ) -> Result<Value, EmberError> {
        if let Some(value) = env.borrow().get(name) {
            return Ok(value);
        }
        if let Some(builtin) = builtins::lookup(name) {
            return Ok(Value::Builtin(builtin));
        }
        Err(EmberError::runtime_error(
            span,
            format!("identifier not found: {}", name),
        ))
    }

    fn evaluate_hash_literal(
        &self,
        pairs: &[(Expr, Expr)],
        env: &Rc<RefCell<Environment>>,
    ) -> Result<Value, EmberError> {
        let mut entries = HashMap::with_capacity(pairs.len());
        for (key_expr, value_expr) in pairs {
            let key_value = self.evaluate_expression(key_expr, env)?;
            let key = key_value.hash_key().ok_or_else(|| {
                EmberError::runtime_error(
                    key_expr.span(),
                    format!(
                        "hash key must be string, integer or boolean, got {}",
                        key_value.type_name()
                    ),
                )
            })?;
            let value = self.evaluate_expression(value_expr, env)?;
            entries.insert(key, value);
        }
        Ok(Value::Hash(entries))
    }

    fn evaluate_prefix_op(
        &self,
        operator: UnaryOp,
        operand: Value,
        span: Span,
    ) -> Result<Value, EmberError> {
        match operator {
            UnaryOp::Not => Ok(Value::Boolean(!operand.is_truthy())),
            UnaryOp::Negate => match operand {
                Value::Integer(value) => Ok(Value::Integer(value.wrapping_neg())),
                other => Err(EmberError::runtime_error(
                    span,
                    format!("- not supported on {} ({})", other.type_name(), other),
                )),
            },
        }
    }

    fn evaluate_binary_op(
        &self,
        operator: BinaryOp,
        left: Value,
        right: Value,
        span: Span,
    ) -> Result<Value, EmberError> {
        match (&left, &right) {
            (Value::Integer(left), Value::Integer(right)) => {
                self.evaluate_integer_op(operator, *left, *right, span)
            }
            (Value::Boolean(left_value), Value::Boolean(right_value)) => match operator {
                BinaryOp::Equal => Ok(Value::Boolean(left_value == right_value)),
                BinaryOp::NotEqual => Ok(Value::Boolean(left_value != right_value)),
                _ => Err(binary_type_error(operator, &left, &right, span)),
            },
            (Value::String(left_value), Value::String(right_value)) => match operator {
                BinaryOp::Add => Ok(Value::String(format!("{}{}", left_value, right_value))),
                BinaryOp::Less => Ok(Value::Boolean(left_value < right_value)),
                BinaryOp::Greater => Ok(Value::Boolean(left_value > right_value)),
                BinaryOp::Equal => Ok(Value::Boolean(left_value == right_value)),
                BinaryOp::NotEqual => Ok(Value::Boolean(left_value != right_value)),
                _ => Err(binary_type_error(operator, &left, &right, span)),
            },
            _ => Err(binary_type_error(operator, &left, &right, span)),
        }
    }

    fn evaluate_integer_op(
        &self,
        operator: BinaryOp,
        left: i64,
        right: i64,
        span: Span,
    ) -> Result<Value, EmberError> {
        match operator {
            BinaryOp::Add => Ok(Value::Integer(left.wrapping_add(right))),
            BinaryOp::Subtract => Ok(Value::Integer(left.wrapping_sub(right))),
            BinaryOp::Multiply => Ok(Value::Integer(left.wrapping_mul(right))),
            BinaryOp::Divide => {
                if right == 0 {
                    Err(EmberError::runtime_error(
                        span,
                        "cannot divide by 0".to_string(),
                    ))
                } else {
                    Ok(Value::Integer(left.wrapping_div(right)))
                }
            }
            BinaryOp::Less => Ok(Value::Boolean(left < right)),
            BinaryOp::Greater => Ok(Value::Boolean(left > right)),
            BinaryOp::Equal => Ok(Value::Boolean(left == right)),
            BinaryOp::NotEqual => Ok(Value::Boolean(left != right)),
        }
    }

    fn evaluate_call(
        &self,
        callee: Value,
        arguments: Vec<Value>,
        span: Span,
    ) -> Result<Value, EmberError> {
        match callee {
            Value::Function(function) => {
                if arguments.len() != function.parameters.len() {
                    return Err(EmberError::runtime_error(
                        span,
                        format!(
                            "function with {} parameters called with {} arguments",
                            function.parameters.len(),
                            arguments.len()
                        ),
                    ));
                }

                // The call frame encloses the captured environment, not the
                // caller's
                let mut call_env = Environment::with_enclosing(Rc::clone(&function.env));
                for (parameter, argument) in function.parameters.iter().zip(arguments) {
                    call_env.set(parameter.clone(), argument);
                }
                let call_env = Rc::new(RefCell::new(call_env));

                match self.execute_statement(&function.body, &call_env)? {
                    Value::Return(value) => Ok(*value),
                    other => Ok(other),
                }
            }
            Value::Builtin(builtin) => (builtin.func)(&arguments)
                .map_err(|message| EmberError::runtime_error(span, message)),
            other => Err(EmberError::runtime_error(
                span,
                format!("not a function: {} ({})", other.type_name(), other),
            )),
        }
    }

    fn evaluate_index(
        &self,
        target: Value,
        index: Value,
        span: Span,
    ) -> Result<Value, EmberError> {
        match target {
            Value::Array(elements) => match index {
                Value::Integer(i) => {
                    if i < 0 || i as usize >= elements.len() {
                        Ok(Value::Null)
                    } else {
                        Ok(elements[i as usize].clone())
                    }
                }
                other => Err(EmberError::runtime_error(
                    span,
                    format!("array index must be an integer, got {}", other.type_name()),
                )),
            },
            Value::Hash(entries) => match index.hash_key() {
                Some(key) => Ok(entries.get(&key).cloned().unwrap_or(Value::Null)),
                None => Err(EmberError::runtime_error(
                    span,
                    format!(
                        "hash index must be string, integer or boolean, got {}",
                        index.type_name()
                    ),
                )),
            },
            other => Err(EmberError::runtime_error(
                span,
                format!("not an array or hash: {} ({})", other.type_name(), other),
            )),
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

fn binary_type_error(operator: BinaryOp, left: &Value, right: &Value, span: Span) -> EmberError {
    EmberError::runtime_error(
        span,
        format!(
            "{} not supported on {} ({}) and {} ({})",
            operator,
            left.type_name(),
            left,
            right.type_name(),
            right
        ),
    )
}
