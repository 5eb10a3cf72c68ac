#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use zpack::{
    codec::{PagePolicy, Tree, TreeConfig},
    json::node_to_json,
};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    data: Vec<u8>,
    fixed_pages: bool,
    page_size: u8,
}

fuzz_target!(|input: FuzzInput| {
    let page_size = usize::from(input.page_size.max(1));
    let pages = if input.fixed_pages {
        PagePolicy::Fixed { pages: 16, page_size }
    } else {
        PagePolicy::Dynamic { page_size }
    };
    let config = TreeConfig::default()
        .with_max_depth(64)
        .with_max_nodes(Some(1 << 16))
        .with_pages(pages);

    // Построение и обход дерева не должны паниковать ни на каких данных.
    let tree = Tree::from_bytes(&input.data, config);
    let _ = node_to_json(tree.root());

    // После ошибки корень всегда nil-узел.
    if tree.error().is_some() {
        assert!(tree.root().id().is_none());
    }
});
