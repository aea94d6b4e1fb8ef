use crate::error::Span;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let {
        name: String,
        value: Expr,
        span: Span,
    },
    Return {
        value: Expr,
        span: Span,
    },
    Expression {
        expr: Expr,
        span: Span,
    },
    Block {
        statements: Vec<Stmt>,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Let { span, .. } => *span,
            Stmt::Return { span, .. } => *span,
            Stmt::Expression { span, .. } => *span,
            Stmt::Block { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Identifier {
        name: String,
        span: Span,
    },
    IntegerLiteral {
        value: i64,
        span: Span,
    },
    BooleanLiteral {
        value: bool,
        span: Span,
    },
    StringLiteral {
        value: String,
        span: Span,
    },
    ArrayLiteral {
        elements: Vec<Expr>,
        span: Span,
    },
    /// Entries keep their source order; keys are arbitrary expressions and
    /// are only narrowed to hash keys at evaluation time.
    HashLiteral {
        pairs: Vec<(Expr, Expr)>,
        span: Span,
    },
    Prefix {
        operator: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Infix {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        span: Span,
    },
    If {
        condition: Box<Expr>,
        consequence: Box<Stmt>,
        alternative: Option<Box<Stmt>>,
        span: Span,
    },
    FunctionLiteral {
        parameters: Vec<String>,
        body: Rc<Stmt>,
        span: Span,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
        span: Span,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Identifier { span, .. } => *span,
            Expr::IntegerLiteral { span, .. } => *span,
            Expr::BooleanLiteral { span, .. } => *span,
            Expr::StringLiteral { span, .. } => *span,
            Expr::ArrayLiteral { span, .. } => *span,
            Expr::HashLiteral { span, .. } => *span,
            Expr::Prefix { span, .. } => *span,
            Expr::Infix { span, .. } => *span,
            Expr::If { span, .. } => *span,
            Expr::FunctionLiteral { span, .. } => *span,
            Expr::Call { span, .. } => *span,
            Expr::Index { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnaryOp::Not => write!(f, "!"),
            UnaryOp::Negate => write!(f, "-"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Less,
    Greater,
    Equal,
    NotEqual,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let op = match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
        };
        write!(f, "{}", op)
    }
}

// The pretty-print below re-parses to the same text (modulo semicolons):
// every prefix and infix expression is fully parenthesised, string literal
// expressions are quoted, and blocks render as `{ stmt; stmt; }`.

fn write_terminated(f: &mut fmt::Formatter, stmt: &Stmt) -> fmt::Result {
    let text = stmt.to_string();
    if text.ends_with(';') {
        write!(f, "{}", text)
    } else {
        write!(f, "{};", text)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for stmt in &self.statements {
            if !first {
                write!(f, " ")?;
            }
            write_terminated(f, stmt)?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stmt::Let { name, value, .. } => write!(f, "let {} = {};", name, value),
            Stmt::Return { value, .. } => write!(f, "return {};", value),
            Stmt::Expression { expr, .. } => write!(f, "{}", expr),
            Stmt::Block { statements, .. } => {
                write!(f, "{{ ")?;
                for stmt in statements {
                    write_terminated(f, stmt)?;
                    write!(f, " ")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Identifier { name, .. } => write!(f, "{}", name),
            Expr::IntegerLiteral { value, .. } => write!(f, "{}", value),
            Expr::BooleanLiteral { value, .. } => write!(f, "{}", value),
            Expr::StringLiteral { value, .. } => write!(f, "\"{}\"", value),
            Expr::ArrayLiteral { elements, .. } => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
            Expr::HashLiteral { pairs, .. } => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Expr::Prefix {
                operator, operand, ..
            } => write!(f, "({}{})", operator, operand),
            Expr::Infix {
                left,
                operator,
                right,
                ..
            } => write!(f, "({} {} {})", left, operator, right),
            Expr::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                write!(f, "if ({}) {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            Expr::FunctionLiteral {
                parameters, body, ..
            } => {
                write!(f, "fn(")?;
                for (i, parameter) in parameters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", parameter)?;
                }
                write!(f, ") {}", body)
            }
            Expr::Call {
                callee, arguments, ..
            } => {
                write!(f, "{}(", callee)?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", argument)?;
                }
                write!(f, ")")
            }
            Expr::Index { target, index, .. } => write!(f, "({}[{}])", target, index),
        }
    }
}
