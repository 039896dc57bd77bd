// Arithmetic parser - the last stage of formula evaluation, after references
// and range functions have been replaced by numbers.
// Supports: numeric literals, + - * /, unary +/-, parentheses. Nothing else.
//
// Values are computed during descent; no tree is built, so only parentheses
// and unary signs add stack depth, and both are bounded by MAX_DEPTH.

/// Deepest nesting of parentheses and unary signs accepted.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

/// Parse and evaluate an arithmetic expression (no leading `=`).
pub fn eval_str(input: &str) -> Result<f64, String> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err("Empty expression".to_string());
    }
    let (value, pos) = parse_add_sub(&tokens, 0, 0)?;
    if pos != tokens.len() {
        return Err(format!("Unexpected token at position {}", pos));
    }
    Ok(value)
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => { chars.next(); }
            '+' => { tokens.push(Token::Plus); chars.next(); }
            '-' => { tokens.push(Token::Minus); chars.next(); }
            '*' => { tokens.push(Token::Star); chars.next(); }
            '/' => { tokens.push(Token::Slash); chars.next(); }
            '(' => { tokens.push(Token::LParen); chars.next(); }
            ')' => { tokens.push(Token::RParen); chars.next(); }
            '0'..='9' | '.' => {
                let mut num_str = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        num_str.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let num: f64 = num_str.parse().map_err(|_| format!("Invalid number: {}", num_str))?;
                tokens.push(Token::Number(num));
            }
            _ => return Err(format!("Unexpected character: {}", c)),
        }
    }

    Ok(tokens)
}

fn parse_add_sub(tokens: &[Token], pos: usize, depth: usize) -> Result<(f64, usize), String> {
    let (mut left, mut pos) = parse_mul_div(tokens, pos, depth)?;

    while pos < tokens.len() {
        let add = match &tokens[pos] {
            Token::Plus => true,
            Token::Minus => false,
            _ => break,
        };
        let (right, new_pos) = parse_mul_div(tokens, pos + 1, depth)?;
        left = if add { left + right } else { left - right };
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_mul_div(tokens: &[Token], pos: usize, depth: usize) -> Result<(f64, usize), String> {
    let (mut left, mut pos) = parse_unary(tokens, pos, depth)?;

    while pos < tokens.len() {
        let mul = match &tokens[pos] {
            Token::Star => true,
            Token::Slash => false,
            _ => break,
        };
        let (right, new_pos) = parse_unary(tokens, pos + 1, depth)?;
        left = if mul {
            left * right
        } else if right == 0.0 {
            return Err("Division by zero".to_string());
        } else {
            left / right
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_unary(tokens: &[Token], pos: usize, depth: usize) -> Result<(f64, usize), String> {
    match tokens.get(pos) {
        Some(Token::Plus) | Some(Token::Minus) => {
            let depth = descend(depth)?;
            let (value, next) = parse_unary(tokens, pos + 1, depth)?;
            let value = if tokens[pos] == Token::Minus { -value } else { value };
            Ok((value, next))
        }
        _ => parse_primary(tokens, pos, depth),
    }
}

fn parse_primary(tokens: &[Token], pos: usize, depth: usize) -> Result<(f64, usize), String> {
    if pos >= tokens.len() {
        return Err("Unexpected end of expression".to_string());
    }

    match &tokens[pos] {
        Token::Number(n) => Ok((*n, pos + 1)),
        Token::LParen => {
            let (value, pos) = parse_add_sub(tokens, pos + 1, descend(depth)?)?;
            match tokens.get(pos) {
                Some(Token::RParen) => Ok((value, pos + 1)),
                Some(_) => Err("Expected closing parenthesis".to_string()),
                None => Err("Missing closing parenthesis".to_string()),
            }
        }
        other => Err(format!("Unexpected token: {:?}", other)),
    }
}

fn descend(depth: usize) -> Result<usize, String> {
    if depth >= MAX_DEPTH {
        Err(format!("Expression nested deeper than {}", MAX_DEPTH))
    } else {
        Ok(depth + 1)
    }
}
