use slrgen::grammar::Grammar;
use slrgen_tests::grammars;

macro_rules! define_tests {
    ($($name:ident),*$(,)?) => {$(
        #[test]
        fn $name() {
            let grammar = Grammar::define(grammars::$name).unwrap();
            eprintln!("grammar:\n{}", grammar);
            let table = slrgen::compute(&grammar).unwrap();
            eprintln!("table:\n---\n{}", table.display(&grammar));
        }
    )*};
}

define_tests! {
    g_expression,
    g_arithmetic,
    g_list,
    g_json,
    g_indirect_left_recursion,
}
