use std::collections::HashMap;

use crate::errors::SpecForgeError;
use crate::merge::{
    ContractTemplate, MergePipeline, PartialContractAssembler, ReferenceRewriter,
    StructuralParser, NEUTRAL_PLACEHOLDER,
};
use crate::models::contract::AnnotationMap;

#[test]
fn unprefixed_rewrite_is_identity_on_plain_annotations() {
    let rewriter = ReferenceRewriter::unprefixed();
    let input = "/// @notice postcondition supply == _totalSupply";
    let output = rewriter.rewrite_block(input, &["_totalSupply".to_string()]);
    assert_eq!(output, input);
}

#[test]
fn prefixes_state_variables_and_old_references() {
    let rewriter = ReferenceRewriter::new(Some("spec".to_string()));
    let input =
        "/// @notice postcondition _balances[to] == __verifier_old_uint(_balances[to]) + value";
    let output = rewriter.rewrite_block(input, &["_balances".to_string()]);
    assert_eq!(
        output,
        "/// @notice postcondition spec._balances[to] == __verifier_old_uint(spec_old._balances[to]) + value"
    );
}

#[test]
fn prefixing_is_idempotent() {
    let rewriter = ReferenceRewriter::new(Some("spec".to_string()));
    let names = vec!["_balances".to_string()];
    let once = rewriter.rewrite_block(
        "/// @notice postcondition _balances[to] >= value",
        &names,
    );
    let twice = rewriter.rewrite_block(&once, &names);
    assert_eq!(once, twice);
}

#[test]
fn rewrites_block_comment_annotations_to_line_markers() {
    let rewriter = ReferenceRewriter::unprefixed();
    let input = "/**\n * @notice postcondition success == true\n */";
    let output = rewriter.rewrite_block(input, &[]);
    assert_eq!(output, "/// @notice postcondition success == true");
}

#[test]
fn template_substitutes_named_placeholders() {
    let template = ContractTemplate::new("before\n$transfer\nafter ${approve} end");
    assert_eq!(template.placeholder_names(), vec!["transfer", "approve"]);

    let mut values = HashMap::new();
    values.insert("transfer".to_string(), "T".to_string());
    values.insert("approve".to_string(), "A".to_string());
    assert_eq!(template.substitute(&values).unwrap(), "before\nT\nafter A end");
}

#[test]
fn template_reports_first_unbound_placeholder() {
    let template = ContractTemplate::new("$transfer and $approve");
    let values = HashMap::new();
    match template.substitute(&values) {
        Err(SpecForgeError::UnboundPlaceholder(name)) => assert_eq!(name, "transfer"),
        other => panic!("expected UnboundPlaceholder, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn template_escapes_literal_dollar() {
    let template = ContractTemplate::new("price is $$5");
    let values = HashMap::new();
    assert_eq!(template.substitute(&values).unwrap(), "price is $5");
}

#[test]
fn pipeline_merges_every_annotated_function() {
    let template = ContractTemplate::new(
        "contract Imp {\n$totalSupply\nfunction totalSupply() public view returns (uint256 supply) { return _totalSupply; }\n$transfer\nfunction transfer(address to, uint value) public returns (bool success) { return true; }\n}",
    );
    let pipeline = MergePipeline::new(template, None);

    let annotated = "\
uint public _totalSupply;

/// @notice postcondition supply == _totalSupply
function totalSupply() public view returns (uint256 supply);

function transfer(address to, uint value) public returns (bool success);
";
    let (artifact, model) = pipeline.merge(annotated).unwrap();
    assert_eq!(model.functions.len(), 2);
    assert!(artifact.contains("/// @notice postcondition supply == _totalSupply"));
    // The unannotated function substitutes to nothing.
    assert!(!artifact.contains('$'));
}

#[test]
fn pipeline_rejects_function_free_candidates() {
    let pipeline = MergePipeline::new(ContractTemplate::new("$x"), None);
    let err = pipeline.merge("uint public _totalSupply;").unwrap_err();
    assert!(matches!(err, SpecForgeError::MergeError(_)));
    assert!(err.is_recoverable());
}

#[test]
fn assembler_places_placeholder_on_unconfirmed_functions() {
    let parser = StructuralParser::new();
    let model = parser.parse(
        "\
uint public _totalSupply;

event Transfer(address indexed from, address indexed to, uint value);

function totalSupply() public view returns (uint256 supply);

function transfer(address to, uint value) public returns (bool success);
",
    );

    let mut confirmed = AnnotationMap::new();
    confirmed.insert(
        &model.functions[0].signature,
        "/// @notice postcondition supply == _totalSupply",
    );

    let assembler = PartialContractAssembler::new("ERC20");
    let contract = assembler.assemble(&model, &confirmed, None);

    assert!(contract.starts_with("pragma solidity >=0.5.0;"));
    assert!(contract.contains("contract ERC20 {"));
    assert!(contract.contains("event Transfer"));
    assert!(contract.contains(
        "    /// @notice postcondition supply == _totalSupply\n    function totalSupply()"
    ));
    // Exactly one unconfirmed function, exactly one placeholder.
    assert_eq!(contract.matches(NEUTRAL_PLACEHOLDER).count(), 1);
}

#[test]
fn assembler_leaves_in_flight_function_bare() {
    let parser = StructuralParser::new();
    let model = parser.parse(
        "\
function totalSupply() public view returns (uint256 supply);

function transfer(address to, uint value) public returns (bool success);
",
    );

    let assembler = PartialContractAssembler::new("ERC20");
    let contract = assembler.assemble(
        &model,
        &AnnotationMap::new(),
        Some(model.functions[1].signature.as_str()),
    );

    // transfer is in flight: no annotation line directly above it.
    assert!(contract.contains("    // Functions\n    /// @notice postcondition true\n    function totalSupply()"));
    assert!(contract.contains("supply);\n\n    function transfer("));
}
