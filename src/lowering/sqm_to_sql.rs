//! SQM to SQL AST Lowering
//!
//! [`SqmToSqlConverter`] is the lowering visitor. One converter lowers one
//! statement: it owns the alias-base manager, the from-index, the table
//! spaces under construction and the parameter list of the pass, and is
//! consumed when the pass ends.
//!
//! From-elements are registered in source order (spaces left to right, root
//! before joins), which fixes alias-base numbering. Clauses, join `on`
//! predicates included, are lowered only after the whole from clause is
//! registered, so any path can reach any from-element of its query and
//! subquery alias bases always follow the from-element ones.

use crate::config::LoweringConfig;
use crate::domain_metamodel::attribute::AttributeDescriptor;
use crate::domain_metamodel::classification::SingularAttributeClassification;
use crate::domain_metamodel::errors::MetamodelError;
use crate::domain_metamodel::metamodel::DomainMetamodel;
use crate::domain_metamodel::types::{BasicType, DomainType, EnumStorage, JavaType};
use crate::sql_ast::{
    FromClause as SqlFromClause, JdbcParameter, JunctionKind, LiteralValue, ParameterBinding,
    QueryLiteral, QuerySpec as SqlQuerySpec, SelectQuery, SqlAssignment, SqlAstTree, SqlExpression,
    SqlJoinType, SqlPredicate, SqlSelection, SqlSelectionKind, SqlSortSpecification, TableGroup,
    TableGroupJoin, TableSpace, DeleteQuery, UpdateQuery,
};
use crate::sqm::*;

use super::alias_base_manager::AliasBaseManager;
use super::errors::LoweringError;
use super::from_clause_index::{FromIndex, GroupPosition, TableGroupLocator, TableGroupRef, TableGroupSource};
use super::function_registry::infer_return_type;
use super::path_resolver::{
    collection_key_predicate, column_equality, column_list, element_expression, entity_name, PathResolver,
    PathTarget,
};
use super::table_group_builder::TableGroupBuilder;

/// What a visitor method produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Lowered {
    Tree(SqlAstTree),
    QuerySpec(SqlQuerySpec),
    /// From-elements were registered into the pass state
    FromElements,
    SelectClause {
        distinct: bool,
        selections: Vec<SqlSelection>,
    },
    Selections(Vec<SqlSelection>),
    Selection(SqlSelection),
    SortSpecifications(Vec<SqlSortSpecification>),
    SortSpecification(SqlSortSpecification),
    Assignment(SqlAssignment),
    Predicate(SqlPredicate),
    Expression(SqlExpression),
}

impl Lowered {
    fn kind(&self) -> &'static str {
        match self {
            Lowered::Tree(_) => "statement",
            Lowered::QuerySpec(_) => "query spec",
            Lowered::FromElements => "from-elements",
            Lowered::SelectClause { .. } => "select clause",
            Lowered::Selections(_) => "select list",
            Lowered::Selection(_) => "selection",
            Lowered::SortSpecifications(_) => "order by clause",
            Lowered::SortSpecification(_) => "sort specification",
            Lowered::Assignment(_) => "assignment",
            Lowered::Predicate(_) => "predicate",
            Lowered::Expression(_) => "expression",
        }
    }

    fn unexpected(self, expected: &'static str) -> LoweringError {
        LoweringError::UnexpectedNode {
            expected,
            found: self.kind(),
        }
    }

    pub fn into_tree(self) -> Result<SqlAstTree, LoweringError> {
        match self {
            Lowered::Tree(tree) => Ok(tree),
            other => Err(other.unexpected("statement")),
        }
    }

    pub fn into_query_spec(self) -> Result<SqlQuerySpec, LoweringError> {
        match self {
            Lowered::QuerySpec(query_spec) => Ok(query_spec),
            other => Err(other.unexpected("query spec")),
        }
    }

    fn into_from_elements(self) -> Result<(), LoweringError> {
        match self {
            Lowered::FromElements => Ok(()),
            other => Err(other.unexpected("from-elements")),
        }
    }

    fn into_select_clause(self) -> Result<(bool, Vec<SqlSelection>), LoweringError> {
        match self {
            Lowered::SelectClause { distinct, selections } => Ok((distinct, selections)),
            other => Err(other.unexpected("select clause")),
        }
    }

    fn into_selections(self) -> Result<Vec<SqlSelection>, LoweringError> {
        match self {
            Lowered::Selections(selections) => Ok(selections),
            other => Err(other.unexpected("select list")),
        }
    }

    fn into_selection(self) -> Result<SqlSelection, LoweringError> {
        match self {
            Lowered::Selection(selection) => Ok(selection),
            other => Err(other.unexpected("selection")),
        }
    }

    fn into_sort_specifications(self) -> Result<Vec<SqlSortSpecification>, LoweringError> {
        match self {
            Lowered::SortSpecifications(sorts) => Ok(sorts),
            other => Err(other.unexpected("order by clause")),
        }
    }

    fn into_sort_specification(self) -> Result<SqlSortSpecification, LoweringError> {
        match self {
            Lowered::SortSpecification(sort) => Ok(sort),
            other => Err(other.unexpected("sort specification")),
        }
    }

    fn into_assignment(self) -> Result<SqlAssignment, LoweringError> {
        match self {
            Lowered::Assignment(assignment) => Ok(assignment),
            other => Err(other.unexpected("assignment")),
        }
    }

    pub fn into_predicate(self) -> Result<SqlPredicate, LoweringError> {
        match self {
            Lowered::Predicate(predicate) => Ok(predicate),
            other => Err(other.unexpected("predicate")),
        }
    }

    pub fn into_expression(self) -> Result<SqlExpression, LoweringError> {
        match self {
            Lowered::Expression(expression) => Ok(expression),
            other => Err(other.unexpected("expression")),
        }
    }
}

pub struct SqmToSqlConverter<'m> {
    metamodel: &'m DomainMetamodel,
    alias_bases: AliasBaseManager,
    from_index: FromIndex,
    spaces: Vec<TableSpace>,
    parameters: Vec<JdbcParameter>,
    generated_aliases: usize,
    /// Join `on` predicates by (space, join position), lowered after registration
    pending_on: Vec<(usize, usize, Predicate)>,
}

impl<'m> SqmToSqlConverter<'m> {
    pub fn new(metamodel: &'m DomainMetamodel, config: &LoweringConfig) -> Self {
        SqmToSqlConverter {
            metamodel,
            alias_bases: AliasBaseManager::new(config.alias_prefix.clone()),
            from_index: FromIndex::new(),
            spaces: Vec::new(),
            parameters: Vec::new(),
            generated_aliases: 0,
            pending_on: Vec::new(),
        }
    }

    /// Ends the pass, handing back the from-element cross-reference.
    pub fn into_from_index(self) -> FromIndex {
        self.from_index
    }

    fn builder(&self) -> TableGroupBuilder<'m> {
        TableGroupBuilder::new(self.metamodel)
    }

    fn paths(&self) -> PathResolver<'_, 'm> {
        PathResolver::new(self.metamodel, &self.from_index, &self.spaces)
    }

    /// Explicit alias, or a synthesized one that no SQM identifier can spell.
    fn from_element_alias(&mut self, alias: Option<&str>) -> String {
        match alias {
            Some(alias) => alias.to_string(),
            None => {
                self.generated_aliases += 1;
                format!("<generated_{}>", self.generated_aliases)
            }
        }
    }

    fn lower_expression(&mut self, expression: &Expression) -> Result<SqlExpression, LoweringError> {
        expression.accept(self)?.into_expression()
    }

    fn lower_predicate(&mut self, predicate: &Predicate) -> Result<SqlPredicate, LoweringError> {
        predicate.accept(self)?.into_predicate()
    }

    fn lower_where(&mut self, where_clause: Option<&WhereClause>) -> Result<Option<SqlPredicate>, LoweringError> {
        where_clause
            .map(|clause| clause.accept(self).and_then(Lowered::into_predicate))
            .transpose()
    }

    fn parameter(&mut self, binding: ParameterBinding, expected_type: Option<DomainType>) -> Result<Lowered, LoweringError> {
        let parameter = JdbcParameter {
            index: self.parameters.len(),
            binding,
            expected_type,
        };
        self.parameters.push(parameter.clone());
        Ok(Lowered::Expression(SqlExpression::Parameter(parameter)))
    }

    fn literal(value: LiteralValue, java_type: Option<JavaType>) -> Result<Lowered, LoweringError> {
        Ok(Lowered::Expression(SqlExpression::Literal(QueryLiteral {
            value,
            literal_type: java_type.map(BasicType::standard),
        })))
    }

    fn lower_pending_on(&mut self) -> Result<(), LoweringError> {
        for (space, position, on) in std::mem::take(&mut self.pending_on) {
            let on = self.lower_predicate(&on)?;
            let joined = self
                .spaces
                .get_mut(space)
                .and_then(|space| space.joins.get_mut(position))
                .ok_or(LoweringError::UnexpectedNode {
                    expected: "registered table group join",
                    found: "dangling join position",
                })?;
            joined.predicate = SqlPredicate::conjunction(joined.predicate.take().into_iter().chain([on]).collect());
        }
        Ok(())
    }

    fn junction(&mut self, kind: JunctionKind, left: &Predicate, right: &Predicate) -> Result<Lowered, LoweringError> {
        let left = self.lower_predicate(left)?;
        let right = self.lower_predicate(right)?;
        Ok(Lowered::Predicate(SqlPredicate::Junction {
            kind,
            predicates: vec![left, right],
        }))
    }

    /// Group, source and generated predicate for `join lhs_alias.attribute`.
    fn attribute_join(
        &self,
        lhs_alias: &str,
        attribute: &str,
        alias_base: &str,
    ) -> Result<(TableGroup, TableGroupSource, Option<SqlPredicate>), LoweringError> {
        let reference = AttributeReference::new(lhs_alias, attribute.split('.').map(str::to_string).collect());
        let paths = self.paths();
        let builder = self.builder();
        let resolved = paths.resolve(&reference)?;

        match resolved.target {
            PathTarget::Attribute(AttributeDescriptor::Singular(singular)) => match singular.classification {
                SingularAttributeClassification::ManyToOne | SingularAttributeClassification::OneToOne => {
                    let target = self.metamodel.resolve_entity_type(&entity_name(singular)?)?;
                    let group = builder.build_entity_group(target, alias_base)?;
                    let lhs_group = paths.group(&resolved.group_ref)?;
                    let lhs = builder.columns_at(
                        lhs_group,
                        singular.table_position + resolved.element_offset,
                        &singular.columns,
                        None,
                    )?;
                    let rhs = builder.columns_at(&group, 0, &target.identifier.columns, None)?;
                    let predicate = column_equality(&singular.role(), lhs, rhs)?;
                    log::debug!(
                        "SqmToSqlConverter: {} join '{}' -> '{}' as '{}'",
                        singular.classification,
                        resolved.path,
                        target.name,
                        alias_base
                    );
                    Ok((group, TableGroupSource::Entity(target.name.clone()), predicate))
                }
                SingularAttributeClassification::Any => Err(MetamodelError::unsupported(
                    singular.role(),
                    "ANY-typed associations cannot be joined",
                )
                .into()),
                SingularAttributeClassification::Basic | SingularAttributeClassification::Embedded => {
                    Err(LoweringError::NotJoinable {
                        role: singular.role(),
                        classification: singular.classification.to_string(),
                    })
                }
            },
            PathTarget::Attribute(AttributeDescriptor::Plural(plural)) => {
                let group = builder.build_collection_group(plural, alias_base)?;
                let owner_identifier = paths.from_element_expression(&resolved.group_ref)?;
                let predicate = collection_key_predicate(self.metamodel, plural, &group, owner_identifier)?;
                log::debug!(
                    "SqmToSqlConverter: collection join '{}' ({:?}) as '{}'",
                    resolved.path,
                    plural.element.classification,
                    alias_base
                );
                Ok((group, TableGroupSource::Collection(plural.role.clone()), predicate))
            }
            PathTarget::ForeignKey { identifier, .. } => Err(LoweringError::NotJoinable {
                role: resolved.path,
                classification: identifier.classification.to_string(),
            }),
        }
    }

    /// Correlated subquery over the collection named by `collection`.
    ///
    /// The subquery's group gets a fresh alias base and is correlated on
    /// "key = owner identifier". It selects the element when
    /// `select_elements` is set, the key otherwise.
    fn collection_subquery(
        &mut self,
        collection: &AttributeReference,
        select_elements: bool,
    ) -> Result<SqlQuerySpec, LoweringError> {
        let (plural, owner_identifier) = {
            let paths = self.paths();
            let resolved = paths.resolve(collection)?;
            let plural = match resolved.target {
                PathTarget::Attribute(AttributeDescriptor::Plural(plural)) => plural,
                _ => {
                    return Err(LoweringError::invalid_path(
                        resolved.path,
                        "is not a collection-valued path",
                    ))
                }
            };
            (plural, paths.from_element_expression(&resolved.group_ref)?)
        };

        let alias_base = self.alias_bases.generate_alias_base();
        let builder = self.builder();
        let group = builder.build_collection_group(plural, &alias_base)?;
        let where_predicate = collection_key_predicate(self.metamodel, plural, &group, owner_identifier)?;
        let selection = if select_elements {
            element_expression(self.metamodel, plural, &group)?
        } else {
            SqlExpression::from_columns(builder.located_column_references(&group, &plural.key_columns)?, None)
        };
        log::debug!(
            "SqmToSqlConverter: subquery over '{}' as '{}'",
            plural.role,
            alias_base
        );

        Ok(SqlQuerySpec {
            distinct: false,
            selections: vec![SqlSelection {
                kind: SqlSelectionKind::Expression(selection),
                alias: None,
            }],
            from_clause: SqlFromClause {
                spaces: vec![TableSpace::new(group)],
            },
            where_predicate,
            sort_specifications: Vec::new(),
        })
    }

    /// Identifier of the first space's root, used when no select clause is given.
    fn default_selection(&self) -> Result<SqlSelection, LoweringError> {
        let root_ref = self
            .from_index
            .iter()
            .map(|(_, group_ref)| group_ref)
            .find(|group_ref| {
                group_ref.locator
                    == TableGroupLocator {
                        space: 0,
                        position: GroupPosition::Root,
                    }
            })
            .ok_or(LoweringError::EmptyFromClause)?;
        let expression = self.paths().from_element_expression(root_ref)?;
        Ok(SqlSelection {
            kind: SqlSelectionKind::Expression(expression),
            alias: None,
        })
    }
}

impl<'m> SemanticQueryVisitor for SqmToSqlConverter<'m> {
    type Output = Result<Lowered, LoweringError>;

    fn visit_select_statement(&mut self, statement: &SelectStatement) -> Self::Output {
        let query_spec = statement.query_spec.accept(self)?.into_query_spec()?;
        Ok(Lowered::Tree(SqlAstTree::Select(SelectQuery {
            query_spec,
            parameters: std::mem::take(&mut self.parameters),
        })))
    }

    fn visit_update_statement(&mut self, statement: &UpdateStatement) -> Self::Output {
        statement.target.accept(self)?.into_from_elements()?;
        let assignments = statement
            .assignments
            .iter()
            .map(|assignment| assignment.accept(self).and_then(Lowered::into_assignment))
            .collect::<Result<Vec<_>, _>>()?;
        let where_predicate = self.lower_where(statement.where_clause.as_ref())?;
        Ok(Lowered::Tree(SqlAstTree::Update(UpdateQuery {
            from_clause: SqlFromClause {
                spaces: std::mem::take(&mut self.spaces),
            },
            assignments,
            where_predicate,
            parameters: std::mem::take(&mut self.parameters),
        })))
    }

    fn visit_delete_statement(&mut self, statement: &DeleteStatement) -> Self::Output {
        statement.target.accept(self)?.into_from_elements()?;
        let where_predicate = self.lower_where(statement.where_clause.as_ref())?;
        Ok(Lowered::Tree(SqlAstTree::Delete(DeleteQuery {
            from_clause: SqlFromClause {
                spaces: std::mem::take(&mut self.spaces),
            },
            where_predicate,
            parameters: std::mem::take(&mut self.parameters),
        })))
    }

    fn visit_assignment(&mut self, assignment: &Assignment) -> Self::Output {
        let target = assignment.target.accept(self)?.into_expression()?;
        let value = self.lower_expression(&assignment.value)?;
        Ok(Lowered::Assignment(SqlAssignment {
            columns: column_list(target),
            value,
        }))
    }

    fn visit_query_spec(&mut self, query_spec: &QuerySpec) -> Self::Output {
        query_spec.from_clause.accept(self)?.into_from_elements()?;

        let (distinct, selections) = match &query_spec.select_clause {
            Some(select_clause) => select_clause.accept(self)?.into_select_clause()?,
            None => (false, vec![self.default_selection()?]),
        };
        let where_predicate = self.lower_where(query_spec.where_clause.as_ref())?;
        let sort_specifications = match &query_spec.order_by_clause {
            Some(order_by) => order_by.accept(self)?.into_sort_specifications()?,
            None => Vec::new(),
        };

        Ok(Lowered::QuerySpec(SqlQuerySpec {
            distinct,
            selections,
            from_clause: SqlFromClause {
                spaces: std::mem::take(&mut self.spaces),
            },
            where_predicate,
            sort_specifications,
        }))
    }

    fn visit_from_clause(&mut self, from_clause: &FromClause) -> Self::Output {
        if from_clause.spaces.is_empty() {
            return Err(LoweringError::EmptyFromClause);
        }
        for space in &from_clause.spaces {
            space.accept(self)?.into_from_elements()?;
        }
        self.lower_pending_on()?;
        Ok(Lowered::FromElements)
    }

    fn visit_from_element_space(&mut self, space: &FromElementSpace) -> Self::Output {
        space.root.accept(self)?.into_from_elements()?;
        for join in &space.joins {
            join.accept(self)?.into_from_elements()?;
        }
        Ok(Lowered::FromElements)
    }

    fn visit_root_entity_from_element(&mut self, root: &RootEntityFromElement) -> Self::Output {
        let alias = self.from_element_alias(root.alias.as_deref());
        let entity = self.metamodel.resolve_entity_type(&root.entity_name)?;
        let alias_base = self.alias_bases.alias_base_for(&alias);
        let group = self.builder().build_entity_group(entity, &alias_base)?;

        self.from_index.cross_reference(
            &alias,
            TableGroupRef {
                locator: TableGroupLocator {
                    space: self.spaces.len(),
                    position: GroupPosition::Root,
                },
                alias_base,
                source: TableGroupSource::Entity(entity.name.clone()),
            },
        )?;
        log::debug!(
            "SqmToSqlConverter: root '{}' ({}) opens space {} with {} table(s)",
            alias,
            entity.name,
            self.spaces.len(),
            group.table_count()
        );
        self.spaces.push(TableSpace::new(group));
        Ok(Lowered::FromElements)
    }

    fn visit_joined_from_element(&mut self, join: &JoinedFromElement) -> Self::Output {
        let join_type = match join.join_type {
            SqmJoinType::Inner | SqmJoinType::Cross => SqlJoinType::Inner,
            SqmJoinType::Left => SqlJoinType::Left,
            SqmJoinType::Right | SqmJoinType::Full => {
                return Err(LoweringError::UnsupportedJoinType {
                    join_type: join.join_type,
                })
            }
        };
        let space = self.spaces.len().checked_sub(1).ok_or(LoweringError::UnexpectedNode {
            expected: "table space",
            found: "joined from-element outside a space",
        })?;

        let alias = self.from_element_alias(join.alias.as_deref());
        let alias_base = self.alias_bases.alias_base_for(&alias);
        let (group, source, predicate) = match &join.source {
            JoinSource::Entity { entity_name } => {
                let entity = self.metamodel.resolve_entity_type(entity_name)?;
                let group = self.builder().build_entity_group(entity, &alias_base)?;
                (group, TableGroupSource::Entity(entity.name.clone()), None)
            }
            JoinSource::Attribute { lhs_alias, attribute } => {
                self.attribute_join(lhs_alias, attribute, &alias_base)?
            }
        };

        let position = self.spaces[space].joins.len();
        self.from_index.cross_reference(
            &alias,
            TableGroupRef {
                locator: TableGroupLocator {
                    space,
                    position: GroupPosition::Join(position),
                },
                alias_base,
                source,
            },
        )?;
        self.spaces[space].joins.push(TableGroupJoin {
            join_type,
            group,
            predicate,
            fetched: join.fetch,
        });

        if let Some(on) = &join.on {
            self.pending_on.push((space, position, on.clone()));
        }
        Ok(Lowered::FromElements)
    }

    fn visit_select_clause(&mut self, select_clause: &SelectClause) -> Self::Output {
        let selections = select_clause.list.accept(self)?.into_selections()?;
        Ok(Lowered::SelectClause {
            distinct: select_clause.distinct,
            selections,
        })
    }

    fn visit_select_list(&mut self, select_list: &SelectList) -> Self::Output {
        let selections = select_list
            .items
            .iter()
            .map(|item| item.accept(self).and_then(Lowered::into_selection))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Lowered::Selections(selections))
    }

    fn visit_select_list_item(&mut self, item: &SelectListItem) -> Self::Output {
        let kind = match &item.selection {
            Selection::Expression(expression) => SqlSelectionKind::Expression(self.lower_expression(expression)?),
            Selection::DynamicInstantiation(instantiation) => instantiation.accept(self)?.into_selection()?.kind,
        };
        Ok(Lowered::Selection(SqlSelection {
            kind,
            alias: item.alias.clone(),
        }))
    }

    fn visit_dynamic_instantiation(&mut self, instantiation: &DynamicInstantiation) -> Self::Output {
        let arguments = instantiation
            .arguments
            .iter()
            .map(|argument| argument.accept(self).and_then(Lowered::into_selection))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Lowered::Selection(SqlSelection {
            kind: SqlSelectionKind::DynamicInstantiation {
                target: instantiation.target.clone(),
                arguments,
            },
            alias: None,
        }))
    }

    fn visit_where_clause(&mut self, where_clause: &WhereClause) -> Self::Output {
        where_clause.predicate.accept(self)
    }

    fn visit_order_by_clause(&mut self, order_by: &OrderByClause) -> Self::Output {
        let sorts = order_by
            .sort_specifications
            .iter()
            .map(|sort| sort.accept(self).and_then(Lowered::into_sort_specification))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Lowered::SortSpecifications(sorts))
    }

    fn visit_sort_specification(&mut self, sort: &SortSpecification) -> Self::Output {
        Ok(Lowered::SortSpecification(SqlSortSpecification {
            expression: self.lower_expression(&sort.expression)?,
            order: sort.order,
        }))
    }

    fn visit_grouped_predicate(&mut self, predicate: &GroupedPredicate) -> Self::Output {
        let inner = self.lower_predicate(&predicate.predicate)?;
        Ok(Lowered::Predicate(SqlPredicate::Grouped(Box::new(inner))))
    }

    fn visit_and_predicate(&mut self, predicate: &AndPredicate) -> Self::Output {
        self.junction(JunctionKind::Conjunction, &predicate.left, &predicate.right)
    }

    fn visit_or_predicate(&mut self, predicate: &OrPredicate) -> Self::Output {
        self.junction(JunctionKind::Disjunction, &predicate.left, &predicate.right)
    }

    fn visit_negated_predicate(&mut self, predicate: &NegatedPredicate) -> Self::Output {
        let inner = self.lower_predicate(&predicate.predicate)?;
        Ok(Lowered::Predicate(SqlPredicate::Negated(Box::new(inner))))
    }

    fn visit_relational_predicate(&mut self, predicate: &RelationalPredicate) -> Self::Output {
        let lhs = self.lower_expression(&predicate.lhs)?;
        let rhs = self.lower_expression(&predicate.rhs)?;
        Ok(Lowered::Predicate(SqlPredicate::Comparison {
            lhs,
            operator: predicate.operator,
            rhs,
        }))
    }

    fn visit_is_null_predicate(&mut self, predicate: &NullnessPredicate) -> Self::Output {
        Ok(Lowered::Predicate(SqlPredicate::Nullness {
            expression: self.lower_expression(&predicate.expression)?,
            negated: predicate.negated,
        }))
    }

    fn visit_is_empty_predicate(&mut self, predicate: &EmptinessPredicate) -> Self::Output {
        let subquery = self.collection_subquery(&predicate.collection, false)?;
        // `is empty` holds when no row exists
        Ok(Lowered::Predicate(SqlPredicate::Exists {
            subquery: Box::new(subquery),
            negated: !predicate.negated,
        }))
    }

    fn visit_between_predicate(&mut self, predicate: &BetweenPredicate) -> Self::Output {
        Ok(Lowered::Predicate(SqlPredicate::Between {
            expression: self.lower_expression(&predicate.expression)?,
            lower_bound: self.lower_expression(&predicate.lower_bound)?,
            upper_bound: self.lower_expression(&predicate.upper_bound)?,
            negated: predicate.negated,
        }))
    }

    fn visit_like_predicate(&mut self, predicate: &LikePredicate) -> Self::Output {
        let match_expression = self.lower_expression(&predicate.match_expression)?;
        let pattern = self.lower_expression(&predicate.pattern)?;
        let escape_character = predicate
            .escape_character
            .as_ref()
            .map(|escape| self.lower_expression(escape))
            .transpose()?;
        Ok(Lowered::Predicate(SqlPredicate::Like {
            match_expression,
            pattern,
            escape_character,
            negated: predicate.negated,
        }))
    }

    fn visit_member_of_predicate(&mut self, predicate: &MemberOfPredicate) -> Self::Output {
        let expression = self.lower_expression(&predicate.value)?;
        let subquery = self.collection_subquery(&predicate.collection, true)?;
        Ok(Lowered::Predicate(SqlPredicate::InSubquery {
            expression,
            subquery: Box::new(subquery),
            negated: predicate.negated,
        }))
    }

    fn visit_positional_parameter(&mut self, parameter: &PositionalParameter) -> Self::Output {
        self.parameter(
            ParameterBinding::Positional(parameter.position),
            parameter.expected_type.clone(),
        )
    }

    fn visit_named_parameter(&mut self, parameter: &NamedParameter) -> Self::Output {
        self.parameter(
            ParameterBinding::Named(parameter.name.clone()),
            parameter.expected_type.clone(),
        )
    }

    fn visit_entity_type_literal(&mut self, literal: &EntityTypeLiteral) -> Self::Output {
        let entity = self.metamodel.resolve_entity_type(&literal.entity_name)?;
        Ok(Lowered::Expression(SqlExpression::EntityTypeLiteral {
            entity_name: entity.name.clone(),
        }))
    }

    fn visit_unary_operation(&mut self, operation: &UnaryOperation) -> Self::Output {
        let operand = self.lower_expression(&operation.operand)?;
        let expression_type = operand.expression_type();
        Ok(Lowered::Expression(SqlExpression::Unary {
            operator: operation.operator,
            operand: Box::new(operand),
            expression_type,
        }))
    }

    fn visit_attribute_reference(&mut self, reference: &AttributeReference) -> Self::Output {
        let paths = self.paths();
        let resolved = paths.resolve(reference)?;
        Ok(Lowered::Expression(paths.singular_expression(&resolved)?))
    }

    fn visit_from_element_reference(&mut self, reference: &FromElementReference) -> Self::Output {
        let group_ref = self.from_index.resolve(&reference.alias)?;
        Ok(Lowered::Expression(self.paths().from_element_expression(group_ref)?))
    }

    fn visit_function(&mut self, function: &FunctionCall) -> Self::Output {
        let arguments = function
            .arguments
            .iter()
            .map(|argument| self.lower_expression(argument))
            .collect::<Result<Vec<_>, _>>()?;
        let result_type = function.result_type.clone().or_else(|| {
            let argument_types: Vec<_> = arguments.iter().map(SqlExpression::expression_type).collect();
            infer_return_type(&function.name, &argument_types)
        });
        Ok(Lowered::Expression(SqlExpression::Function {
            name: function.name.clone(),
            arguments,
            result_type,
        }))
    }

    fn visit_concatenation(&mut self, concatenation: &Concatenation) -> Self::Output {
        let lhs = self.lower_expression(&concatenation.lhs)?;
        let rhs = self.lower_expression(&concatenation.rhs)?;
        let expression_type = concatenation
            .explicit_type
            .clone()
            .or_else(|| lhs.expression_type());
        Ok(Lowered::Expression(SqlExpression::Concatenation {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            expression_type,
        }))
    }

    fn visit_constant_enum(&mut self, constant: &ConstantEnum) -> Self::Output {
        let java_type = JavaType::Enum {
            name: constant.enum_name.clone(),
            storage: constant.storage.clone().unwrap_or(EnumStorage::Ordinal),
        };
        Self::literal(
            LiteralValue::Enum {
                enum_name: constant.enum_name.clone(),
                constant_name: constant.constant_name.clone(),
                ordinal: constant.ordinal,
            },
            Some(java_type),
        )
    }

    fn visit_constant_field(&mut self, constant: &ConstantField) -> Self::Output {
        log::trace!(
            "SqmToSqlConverter: constant {}.{} inlined",
            constant.class_name,
            constant.field_name
        );
        constant.value.accept(self)
    }

    fn visit_binary_arithmetic(&mut self, arithmetic: &BinaryArithmetic) -> Self::Output {
        let lhs = self.lower_expression(&arithmetic.lhs)?;
        let rhs = self.lower_expression(&arithmetic.rhs)?;
        let expression_type = arithmetic.explicit_type.clone().or_else(|| {
            match (lhs.expression_type(), rhs.expression_type()) {
                (Some(DomainType::Basic(l)), Some(DomainType::Basic(r))) => {
                    Some(DomainType::Basic(BasicType::promote(&l, &r)))
                }
                (Some(l), _) => Some(l),
                (None, r) => r,
            }
        });
        Ok(Lowered::Expression(SqlExpression::BinaryArithmetic {
            lhs: Box::new(lhs),
            operator: arithmetic.operator,
            rhs: Box::new(rhs),
            expression_type,
        }))
    }

    fn visit_literal_string(&mut self, value: &str) -> Self::Output {
        Self::literal(LiteralValue::String(value.to_string()), Some(JavaType::String))
    }

    fn visit_literal_character(&mut self, value: char) -> Self::Output {
        Self::literal(LiteralValue::Character(value), Some(JavaType::Character))
    }

    fn visit_literal_double(&mut self, value: f64) -> Self::Output {
        Self::literal(LiteralValue::Double(value), Some(JavaType::Double))
    }

    fn visit_literal_integer(&mut self, value: i32) -> Self::Output {
        Self::literal(LiteralValue::Integer(value), Some(JavaType::Integer))
    }

    fn visit_literal_big_integer(&mut self, digits: &str) -> Self::Output {
        Self::literal(LiteralValue::BigInteger(digits.to_string()), Some(JavaType::BigInteger))
    }

    fn visit_literal_big_decimal(&mut self, text: &str) -> Self::Output {
        Self::literal(LiteralValue::BigDecimal(text.to_string()), Some(JavaType::BigDecimal))
    }

    fn visit_literal_float(&mut self, value: f32) -> Self::Output {
        Self::literal(LiteralValue::Float(value), Some(JavaType::Float))
    }

    fn visit_literal_long(&mut self, value: i64) -> Self::Output {
        Self::literal(LiteralValue::Long(value), Some(JavaType::Long))
    }

    fn visit_literal_true(&mut self) -> Self::Output {
        Self::literal(LiteralValue::Boolean(true), Some(JavaType::Boolean))
    }

    fn visit_literal_false(&mut self) -> Self::Output {
        Self::literal(LiteralValue::Boolean(false), Some(JavaType::Boolean))
    }

    fn visit_literal_null(&mut self) -> Self::Output {
        Self::literal(LiteralValue::Null, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_metamodel::config::MetamodelConfig;
    use crate::lowering::lower;
    use crate::sql_ast::ColumnReference;

    const YAML: &str = r#"
entities:
  - name: Base
    table: base
    identifier: { columns: [id], type: long }
    attributes:
      - { kind: basic, name: description, type: string }
  - name: Branch
    extends: Base
    table: branch
    attributes:
      - { kind: basic, name: level, type: integer }
  - name: Leaf
    extends: Branch
    table: leaf
    attributes:
      - { kind: basic, name: color, type: string }
  - name: Customer
    table: customer
    identifier: { columns: [id], type: long }
    attributes:
      - { kind: basic, name: name, type: string }
      - { kind: embedded, name: address, embeddable: Address }
      - { kind: one_to_many, name: orders, target: Order, key_columns: [customer_id] }
  - name: Order
    table: orders
    identifier: { columns: [id], type: long }
    attributes:
      - { kind: many_to_one, name: customer, target: Customer }
      - { kind: basic, name: total, type: big_decimal }
embeddables:
  - name: Address
    attributes:
      - { kind: basic, name: city, type: string }
"#;

    fn metamodel() -> DomainMetamodel {
        MetamodelConfig::from_yaml_str(YAML)
            .unwrap()
            .build_metamodel()
            .unwrap()
    }

    fn lower_query(query_spec: QuerySpec) -> Result<(SqlAstTree, FromIndex), LoweringError> {
        lower(&SqmStatement::Select(SelectStatement { query_spec }), &metamodel())
    }

    fn query_spec(tree: &SqlAstTree) -> &SqlQuerySpec {
        match tree {
            SqlAstTree::Select(select) => &select.query_spec,
            other => panic!("expected a select tree, got {:?}", other),
        }
    }

    fn single_column(expression: &SqlExpression) -> &ColumnReference {
        let columns = expression.column_references();
        assert_eq!(columns.len(), 1, "expected one column in {:?}", expression);
        columns[0]
    }

    fn selected(tree: &SqlAstTree, index: usize) -> &SqlExpression {
        match &query_spec(tree).selections[index].kind {
            SqlSelectionKind::Expression(expression) => expression,
            other => panic!("expected an expression selection, got {:?}", other),
        }
    }

    fn from(entity: &str, alias: &str) -> FromClause {
        FromClause::single(RootEntityFromElement::new(entity, alias))
    }

    #[test]
    fn test_default_selection_is_root_identifier() {
        let (tree, index) = lower_query(QuerySpec::new(from("Base", "b"))).unwrap();
        let column = single_column(selected(&tree, 0));
        assert_eq!(column.identification_variable, "j1_0");
        assert_eq!(column.expression.text(), "id");
        assert_eq!(index.resolve("b").unwrap().alias_base, "j1");
    }

    #[test]
    fn test_subclass_attribute_reads_its_own_table() {
        let query = QuerySpec::new(from("Base", "b")).with_select(SelectClause::of(vec![
            Expression::path("b.description"),
            Expression::path("b.level"),
            Expression::path("b.color"),
        ]));
        let (tree, _) = lower_query(query).unwrap();
        let id_vars: Vec<_> = (0..3)
            .map(|i| single_column(selected(&tree, i)).identification_variable.clone())
            .collect();
        assert_eq!(id_vars, vec!["j1_0", "j1_1", "j1_2"]);
    }

    #[test]
    fn test_embedded_path() {
        let query = QuerySpec::new(from("Customer", "c"))
            .with_select(SelectClause::of(vec![Expression::path("c.address.city")]));
        let (tree, _) = lower_query(query).unwrap();
        let column = single_column(selected(&tree, 0));
        assert_eq!(column.identification_variable, "j1_0");
        assert_eq!(column.expression.text(), "city");
    }

    #[test]
    fn test_many_to_one_join_predicate() {
        let space = FromElementSpace::new(RootEntityFromElement::new("Order", "o"))
            .with_join(JoinedFromElement::attribute(SqmJoinType::Inner, "o", "customer", "c"));
        let (tree, index) = lower_query(QuerySpec::new(FromClause::new(vec![space]))).unwrap();

        assert_eq!(index.resolve("c").unwrap().alias_base, "j2");
        let join = &query_spec(&tree).from_clause.spaces[0].joins[0];
        assert_eq!(join.join_type, SqlJoinType::Inner);
        match join.predicate.as_ref().unwrap() {
            SqlPredicate::Comparison { lhs, rhs, .. } => {
                let lhs = single_column(lhs);
                let rhs = single_column(rhs);
                assert_eq!((lhs.identification_variable.as_str(), lhs.expression.text()), ("j1_0", "customer_id"));
                assert_eq!((rhs.identification_variable.as_str(), rhs.expression.text()), ("j2_0", "id"));
            }
            other => panic!("unexpected join predicate {:?}", other),
        }
    }

    #[test]
    fn test_on_predicate_is_anded_after_generated_one() {
        let join = JoinedFromElement::attribute(SqmJoinType::Left, "c", "orders", "o").with_on(
            Predicate::relational(
                Expression::path("o.total"),
                RelationalOperator::GreaterThan,
                Expression::integer(10),
            ),
        );
        let space = FromElementSpace::new(RootEntityFromElement::new("Customer", "c")).with_join(join);
        let (tree, _) = lower_query(QuerySpec::new(FromClause::new(vec![space]))).unwrap();

        let join = &query_spec(&tree).from_clause.spaces[0].joins[0];
        assert_eq!(join.join_type, SqlJoinType::Left);
        match join.predicate.as_ref().unwrap() {
            SqlPredicate::Junction { kind, predicates } => {
                assert_eq!(*kind, JunctionKind::Conjunction);
                assert_eq!(predicates.len(), 2);
                assert!(matches!(
                    predicates[1],
                    SqlPredicate::Comparison {
                        operator: RelationalOperator::GreaterThan,
                        ..
                    }
                ));
            }
            other => panic!("unexpected join predicate {:?}", other),
        }
    }

    #[test]
    fn test_association_identifier_reads_foreign_key() {
        let query = QuerySpec::new(from("Order", "o"))
            .with_select(SelectClause::of(vec![Expression::path("o.customer.id")]));
        let (tree, _) = lower_query(query).unwrap();
        let column = single_column(selected(&tree, 0));
        assert_eq!(column.expression.text(), "customer_id");
        assert_eq!(query_spec(&tree).from_clause.spaces[0].joins.len(), 0);
    }

    #[test]
    fn test_association_dereference_requires_join() {
        let query = QuerySpec::new(from("Order", "o"))
            .with_select(SelectClause::of(vec![Expression::path("o.customer.name")]));
        assert!(matches!(lower_query(query), Err(LoweringError::InvalidPath { .. })));
    }

    #[test]
    fn test_plural_path_outside_join_is_invalid() {
        let query = QuerySpec::new(from("Customer", "c"))
            .with_select(SelectClause::of(vec![Expression::path("c.orders")]));
        assert!(matches!(lower_query(query), Err(LoweringError::InvalidPath { .. })));
    }

    #[test]
    fn test_basic_attribute_is_not_joinable() {
        let space = FromElementSpace::new(RootEntityFromElement::new("Customer", "c"))
            .with_join(JoinedFromElement::attribute(SqmJoinType::Inner, "c", "name", "n"));
        let err = lower_query(QuerySpec::new(FromClause::new(vec![space]))).unwrap_err();
        assert!(matches!(err, LoweringError::NotJoinable { .. }));
    }

    #[test]
    fn test_right_join_is_unsupported() {
        let space = FromElementSpace::new(RootEntityFromElement::new("Order", "o"))
            .with_join(JoinedFromElement::attribute(SqmJoinType::Right, "o", "customer", "c"));
        let err = lower_query(QuerySpec::new(FromClause::new(vec![space]))).unwrap_err();
        assert_eq!(
            err,
            LoweringError::UnsupportedJoinType {
                join_type: SqmJoinType::Right
            }
        );
    }

    #[test]
    fn test_duplicate_alias_fails() {
        let from_clause = FromClause::new(vec![
            FromElementSpace::new(RootEntityFromElement::new("Order", "x")),
            FromElementSpace::new(RootEntityFromElement::new("Customer", "x")),
        ]);
        let err = lower_query(QuerySpec::new(from_clause)).unwrap_err();
        assert!(matches!(err, LoweringError::DuplicateFromElementAlias { .. }));
    }

    #[test]
    fn test_unaliased_roots_get_distinct_bases() {
        let from_clause = FromClause::new(vec![
            FromElementSpace::new(RootEntityFromElement::unaliased("Order")),
            FromElementSpace::new(RootEntityFromElement::unaliased("Customer")),
        ]);
        let (tree, index) = lower_query(QuerySpec::new(from_clause)).unwrap();
        assert_eq!(index.len(), 2);
        let bases: Vec<_> = query_spec(&tree)
            .from_clause
            .groups()
            .map(|g| g.alias_base.as_str())
            .collect();
        assert_eq!(bases, vec!["j1", "j2"]);
    }

    #[test]
    fn test_is_empty_lowers_to_not_exists() {
        let query = QuerySpec::new(from("Customer", "c"))
            .with_where(Predicate::is_empty(AttributeReference::parse("c.orders"), false));
        let (tree, _) = lower_query(query).unwrap();

        let Some(SqlPredicate::Exists { subquery, negated }) = &query_spec(&tree).where_predicate else {
            panic!("expected an exists predicate");
        };
        assert!(*negated);
        let group = &subquery.from_clause.spaces[0].root;
        assert_eq!(group.alias_base, "j2");
        assert_eq!(group.root_table.reference.table_expression(), "orders");
        match subquery.where_predicate.as_ref().unwrap() {
            SqlPredicate::Comparison { lhs, rhs, .. } => {
                assert_eq!(single_column(lhs).identification_variable, "j2_0");
                assert_eq!(single_column(lhs).expression.text(), "customer_id");
                assert_eq!(single_column(rhs).identification_variable, "j1_0");
            }
            other => panic!("unexpected correlation {:?}", other),
        }
    }

    #[test]
    fn test_member_of_selects_elements() {
        let query = QuerySpec::new(FromClause::new(vec![
            FromElementSpace::new(RootEntityFromElement::new("Customer", "c")),
            FromElementSpace::new(RootEntityFromElement::new("Order", "o")),
        ]))
        .with_where(Predicate::member_of(
            Expression::from_element("o"),
            AttributeReference::parse("c.orders"),
            true,
        ));
        let (tree, _) = lower_query(query).unwrap();

        let Some(SqlPredicate::InSubquery {
            expression,
            subquery,
            negated,
        }) = &query_spec(&tree).where_predicate
        else {
            panic!("expected an in-subquery predicate");
        };
        assert!(*negated);
        assert_eq!(single_column(expression).identification_variable, "j2_0");
        let SqlSelectionKind::Expression(element) = &subquery.selections[0].kind else {
            panic!("expected an expression selection");
        };
        assert_eq!(single_column(element).identification_variable, "j3_0");
        assert_eq!(single_column(element).expression.text(), "id");
    }

    #[test]
    fn test_parameters_keep_encounter_order() {
        let query = QuerySpec::new(from("Order", "o")).with_where(Predicate::and(
            Predicate::relational(
                Expression::path("o.total"),
                RelationalOperator::GreaterThan,
                Expression::named_parameter("min"),
            ),
            Predicate::relational(
                Expression::path("o.total"),
                RelationalOperator::LessThan,
                Expression::positional_parameter(1),
            ),
        ));
        let (tree, _) = lower_query(query).unwrap();
        let bindings: Vec<_> = tree
            .parameters()
            .iter()
            .map(|p| (p.index, p.binding.clone()))
            .collect();
        assert_eq!(
            bindings,
            vec![
                (0, ParameterBinding::Named("min".to_string())),
                (1, ParameterBinding::Positional(1)),
            ]
        );
    }

    #[test]
    fn test_concatenation_takes_left_type() {
        let query = QuerySpec::new(from("Customer", "c")).with_select(SelectClause::of(vec![
            Expression::concat(Expression::path("c.name"), Expression::integer(1)),
        ]));
        let (tree, _) = lower_query(query).unwrap();
        assert_eq!(
            selected(&tree, 0).expression_type(),
            Some(DomainType::Basic(BasicType::string()))
        );
    }

    #[test]
    fn test_arithmetic_promotes_operands() {
        let query = QuerySpec::new(from("Order", "o")).with_select(SelectClause::of(vec![
            Expression::arithmetic(Expression::integer(2), ArithmeticOperator::Multiply, Expression::path("o.total")),
        ]));
        let (tree, _) = lower_query(query).unwrap();
        let Some(DomainType::Basic(basic)) = selected(&tree, 0).expression_type() else {
            panic!("expected a basic result type");
        };
        assert_eq!(basic.java_type, JavaType::BigDecimal);
    }

    #[test]
    fn test_function_result_type_is_inferred() {
        let query = QuerySpec::new(from("Customer", "c")).with_select(SelectClause::of(vec![
            Expression::function("length", vec![Expression::path("c.name")]),
        ]));
        let (tree, _) = lower_query(query).unwrap();
        assert_eq!(
            selected(&tree, 0).expression_type(),
            Some(DomainType::Basic(BasicType::integer()))
        );
    }

    #[test]
    fn test_entity_type_literal_resolves_entity() {
        let query = QuerySpec::new(from("Base", "b")).with_select(SelectClause::of(vec![
            Expression::EntityType(EntityTypeLiteral {
                entity_name: "Nope".to_string(),
            }),
        ]));
        let err = lower_query(query).unwrap_err();
        assert_eq!(err, LoweringError::Metamodel(MetamodelError::unknown_entity("Nope")));
    }

    #[test]
    fn test_delete_targets_entity_group() {
        let statement = SqmStatement::Delete(DeleteStatement {
            target: RootEntityFromElement::new("Leaf", "l"),
            where_clause: Some(WhereClause {
                predicate: Predicate::is_null(Expression::path("l.color"), false),
            }),
        });
        let (tree, index) = lower(&statement, &metamodel()).unwrap();
        assert!(matches!(tree, SqlAstTree::Delete(_)));
        let group = tree.find_table_group(index.resolve("l").unwrap()).unwrap();
        assert_eq!(group.identification_variables(), vec!["j1_0", "j1_1", "j1_2"]);
    }

    #[test]
    fn test_update_assignments() {
        let statement = SqmStatement::Update(UpdateStatement {
            target: RootEntityFromElement::new("Customer", "c"),
            assignments: vec![Assignment {
                target: AttributeReference::parse("c.name"),
                value: Expression::named_parameter("name"),
            }],
            where_clause: None,
        });
        let (tree, _) = lower(&statement, &metamodel()).unwrap();
        let SqlAstTree::Update(update) = tree else {
            panic!("expected an update tree");
        };
        assert_eq!(update.assignments.len(), 1);
        assert_eq!(single_column(&update.assignments[0].columns[0]).expression.text(), "name");
        assert_eq!(update.parameters.len(), 1);
    }

    #[test]
    fn test_wrong_node_category_is_reported() {
        let err = Lowered::FromElements.into_expression().unwrap_err();
        assert_eq!(
            err,
            LoweringError::UnexpectedNode {
                expected: "expression",
                found: "from-elements"
            }
        );
    }
}
