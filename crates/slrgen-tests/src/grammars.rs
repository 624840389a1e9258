//! Grammar definitions for integration tests.

use slrgen::{
    error::GrammarError,
    grammar::{GrammarDef, SymbolID::*},
};

/// The textbook expression grammar.
pub fn g_expression(g: &mut GrammarDef) -> Result<(), GrammarError> {
    let plus = g.terminal("+")?;
    let star = g.terminal("*")?;
    let lparen = g.terminal("(")?;
    let rparen = g.terminal(")")?;
    let id = g.terminal("id")?;

    let s = g.nonterminal("S")?;
    let e = g.nonterminal("E")?;
    let t = g.nonterminal("T")?;
    let f = g.nonterminal("F")?;

    g.rule(s, [N(e)])?;
    g.rule(e, [N(e), T(plus), N(t)])?;
    g.rule(e, [N(t)])?;
    g.rule(t, [N(t), T(star), N(f)])?;
    g.rule(t, [N(f)])?;
    g.rule(f, [T(lparen), N(e), T(rparen)])?;
    g.rule(f, [T(id)])?;

    Ok(())
}

pub fn g_arithmetic(g: &mut GrammarDef) -> Result<(), GrammarError> {
    // declare terminal symbols.
    let lparen = g.terminal("(")?;
    let rparen = g.terminal(")")?;
    let plus = g.terminal("+")?;
    let minus = g.terminal("-")?;
    let star = g.terminal("*")?;
    let slash = g.terminal("/")?;
    let num = g.terminal("NUM")?;

    // declare nonterminal symbols.
    let program = g.nonterminal("PROGRAM")?;
    let expr = g.nonterminal("EXPR")?;
    let factor = g.nonterminal("FACTOR")?;
    let term = g.nonterminal("TERM")?;

    // declare syntax rules.
    g.rule(program, [N(expr)])?;
    g.rule(expr, [N(expr), T(plus), N(factor)])?;
    g.rule(expr, [N(expr), T(minus), N(factor)])?;
    g.rule(expr, [N(factor)])?;
    g.rule(factor, [N(factor), T(star), N(term)])?;
    g.rule(factor, [N(factor), T(slash), N(term)])?;
    g.rule(factor, [N(term)])?;
    g.rule(term, [T(num)])?;
    g.rule(term, [T(lparen), N(expr), T(rparen)])?;

    Ok(())
}

/// Comma separated list, right recursive.
pub fn g_list(g: &mut GrammarDef) -> Result<(), GrammarError> {
    let x = g.terminal("x")?;
    let comma = g.terminal(",")?;
    let start = g.nonterminal("START")?;
    let list = g.nonterminal("LIST")?;

    g.rule(start, [N(list)])?;
    g.rule(list, [T(x), T(comma), N(list)])?;
    g.rule(list, [T(x)])?;

    Ok(())
}

pub fn g_json(g: &mut GrammarDef) -> Result<(), GrammarError> {
    let lbrace = g.terminal("{")?;
    let rbrace = g.terminal("}")?;
    let lbracket = g.terminal("[")?;
    let rbracket = g.terminal("]")?;
    let colon = g.terminal(":")?;
    let comma = g.terminal(",")?;
    let string = g.terminal("STRING")?;
    let number = g.terminal("NUMBER")?;

    let json = g.nonterminal("JSON")?;
    let value = g.nonterminal("VALUE")?;
    let object = g.nonterminal("OBJECT")?;
    let members = g.nonterminal("MEMBERS")?;
    let pair = g.nonterminal("PAIR")?;
    let array = g.nonterminal("ARRAY")?;
    let elements = g.nonterminal("ELEMENTS")?;

    g.rule(json, [N(value)])?;
    g.rule(value, [N(object)])?;
    g.rule(value, [N(array)])?;
    g.rule(value, [T(string)])?;
    g.rule(value, [T(number)])?;
    g.rule(object, [T(lbrace), N(members), T(rbrace)])?;
    g.rule(object, [T(lbrace), T(rbrace)])?;
    g.rule(members, [N(pair)])?;
    g.rule(members, [N(pair), T(comma), N(members)])?;
    g.rule(pair, [T(string), T(colon), N(value)])?;
    g.rule(array, [T(lbracket), N(elements), T(rbracket)])?;
    g.rule(array, [T(lbracket), T(rbracket)])?;
    g.rule(elements, [N(value)])?;
    g.rule(elements, [N(value), T(comma), N(elements)])?;

    Ok(())
}

/// Not SLR(1): after `ID`, both `A -> ID` and `T -> ID` can be reduced on `$`.
pub fn g_assignment(g: &mut GrammarDef) -> Result<(), GrammarError> {
    let equal = g.terminal("=")?;
    let plus = g.terminal("+")?;
    let ident = g.terminal("ID")?;
    let num = g.terminal("NUM")?;

    let a = g.nonterminal("A")?;
    let e = g.nonterminal("E")?;
    let t = g.nonterminal("T")?;

    g.rule(a, [N(e), T(equal), N(e)])?;
    g.rule(a, [T(ident)])?;
    g.rule(e, [N(e), T(plus), N(t)])?;
    g.rule(e, [N(t)])?;
    g.rule(t, [T(num)])?;
    g.rule(t, [T(ident)])?;

    Ok(())
}

/// `A -> x` declared twice.
pub fn g_duplicate(g: &mut GrammarDef) -> Result<(), GrammarError> {
    let x = g.terminal("x")?;
    let s = g.nonterminal("S")?;
    let a = g.nonterminal("A")?;

    g.rule(s, [N(a)])?;
    g.rule(a, [T(x)])?;
    g.rule(a, [T(x)])?;

    Ok(())
}

/// `A` and `B` are left recursive through each other.
pub fn g_indirect_left_recursion(g: &mut GrammarDef) -> Result<(), GrammarError> {
    let a = g.terminal("a")?;
    let b = g.terminal("b")?;
    let c = g.terminal("c")?;

    let s_ = g.nonterminal("S")?;
    let a_ = g.nonterminal("A")?;
    let b_ = g.nonterminal("B")?;

    g.rule(s_, [N(a_)])?;
    g.rule(a_, [N(b_), T(a)])?;
    g.rule(b_, [N(a_), T(b)])?;
    g.rule(b_, [T(c)])?;

    Ok(())
}

/// `FOLLOW(A)` and `FOLLOW(B)` depend on each other.
pub fn g_cyclic_follow(g: &mut GrammarDef) -> Result<(), GrammarError> {
    let a = g.terminal("a")?;
    let b = g.terminal("b")?;
    let c = g.terminal("c")?;
    let d = g.terminal("d")?;

    let s_ = g.nonterminal("S")?;
    let a_ = g.nonterminal("A")?;
    let b_ = g.nonterminal("B")?;

    g.rule(s_, [T(a), N(a_)])?;
    g.rule(a_, [T(b), N(b_)])?;
    g.rule(a_, [T(c)])?;
    g.rule(b_, [T(d), N(a_)])?;

    Ok(())
}
