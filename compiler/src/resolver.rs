use std::collections::HashMap;

use tracing::debug;

use crate::{
    config::CompileConfig,
    error::SchemaError,
    gen::rust,
    ir::{Field, Package, PackageId, Primitive, Schema, Struct, StructId, Type, TypeKind, MAX_FIELDS},
    types::SchemaFile,
    utils::{quote, title},
};

/// Identifiers the backends derive from a struct name: Go and Java title-case
/// it, Rust converts it to PascalCase.
fn struct_spellings(name: &str) -> [String; 2] {
    [title(name), rust::type_name(name)]
}

/// Identifiers the backends derive from a field name.
fn field_spellings(name: &str) -> [String; 2] {
    [title(name), rust::field_name(name)]
}

fn clash(a: &[String; 2], b: &[String; 2]) -> bool {
    a.iter().zip(b).any(|(x, y)| x == y)
}

/// Builds the IR from parsed files: groups structs into packages, assigns
/// field indices, resolves type names and applies `config`.
///
/// Returns the first violation found. No partial schema is ever returned.
pub fn resolve(files: &[SchemaFile], config: &CompileConfig) -> Result<Schema, SchemaError> {
    let mut schema = Schema::default();
    let mut package_ids: HashMap<&str, PackageId> = HashMap::new();
    // (package, struct name) -> struct
    let mut struct_ids: HashMap<(PackageId, &str), StructId> = HashMap::new();
    // struct name -> every struct with that name
    let mut by_name: HashMap<&str, Vec<StructId>> = HashMap::new();

    // 1) Packages and structs, with duplicate checks
    for file in files {
        let err = |msg: String, line: usize, column: usize| {
            let e = SchemaError::new(msg, line, column);
            match &file.path {
                Some(p) => e.in_file(p),
                None => e,
            }
        };

        let package = match package_ids.get(file.package.as_str()) {
            Some(&id) => id,
            None => {
                if let Some(other) = schema
                    .packages
                    .iter()
                    .find(|p| p.declared.eq_ignore_ascii_case(&file.package))
                {
                    return Err(err(
                        format!(
                            "Package name {} is inconsistent with {}",
                            quote(&file.package),
                            quote(&other.declared)
                        ),
                        file.line,
                        file.column,
                    ));
                }
                let id = PackageId(schema.packages.len());
                schema.packages.push(Package {
                    name:     config.package_name(&file.package),
                    declared: file.package.clone(),
                    size_max: config.size_max.clone(),
                    list_max: config.list_max.clone(),
                    structs:  Vec::new(),
                });
                package_ids.insert(file.package.as_str(), id);
                id
            }
        };

        for def in &file.definitions {
            if Primitive::from_name(&def.name).is_some() {
                return Err(err(
                    format!("The type name {} is reserved", quote(&def.name)),
                    def.line,
                    def.column,
                ));
            }
            if struct_ids.contains_key(&(package, def.name.as_str())) {
                return Err(err(
                    format!(
                        "The type {} is defined twice in package {}",
                        quote(&def.name),
                        quote(&file.package)
                    ),
                    def.line,
                    def.column,
                ));
            }
            let spellings = struct_spellings(&def.name);
            if let Some(other) = schema.packages[package.0]
                .structs
                .iter()
                .map(|&id| &schema.struct_(id).name)
                .find(|other| clash(&struct_spellings(other), &spellings))
            {
                return Err(err(
                    format!(
                        "The types {} and {} of package {} map to the same generated name",
                        quote(other),
                        quote(&def.name),
                        quote(&file.package)
                    ),
                    def.line,
                    def.column,
                ));
            }
            if def.fields.len() > MAX_FIELDS {
                let extra = &def.fields[MAX_FIELDS];
                return Err(err(
                    format!(
                        "Struct {} has more than {} fields",
                        quote(&def.name),
                        MAX_FIELDS
                    ),
                    extra.line,
                    extra.column,
                ));
            }

            let mut fields = Vec::with_capacity(def.fields.len());
            for (i, field) in def.fields.iter().enumerate() {
                if def.fields[..i].iter().any(|f| f.name == field.name) {
                    return Err(err(
                        format!(
                            "The field {} is defined twice in struct {}",
                            quote(&field.name),
                            quote(&def.name)
                        ),
                        field.line,
                        field.column,
                    ));
                }
                let spellings = field_spellings(&field.name);
                if let Some(other) = def.fields[..i]
                    .iter()
                    .find(|f| clash(&field_spellings(&f.name), &spellings))
                {
                    return Err(err(
                        format!(
                            "The fields {} and {} of struct {} map to the same generated name",
                            quote(&other.name),
                            quote(&field.name),
                            quote(&def.name)
                        ),
                        field.line,
                        field.column,
                    ));
                }
                fields.push(Field {
                    name:   field.name.clone(),
                    index:  i as u8,
                    // Placeholder until step 2
                    ty:     Type::primitive(Primitive::Bool),
                    line:   field.line,
                    column: field.column,
                });
            }

            let id = StructId(schema.structs.len());
            schema.structs.push(Struct {
                name: def.name.clone(),
                package,
                fields,
                file: file.path.clone(),
                line: def.line,
            });
            schema.packages[package.0].structs.push(id);
            struct_ids.insert((package, def.name.as_str()), id);
            by_name.entry(def.name.as_str()).or_default().push(id);
        }
    }

    // 2) Field types, against the complete table
    let mut id = 0;
    for file in files {
        for def in &file.definitions {
            let owner = StructId(id);
            id += 1;
            let package = schema.struct_(owner).package;

            for (i, field) in def.fields.iter().enumerate() {
                let kind = lookup(&field.type_, package, &package_ids, &struct_ids, &by_name, &schema)
                    .map_err(|msg| {
                        let e = SchemaError::new(
                            format!("{} for field {}", msg, quote(&field.name)),
                            field.line,
                            field.column,
                        );
                        match &file.path {
                            Some(p) => e.in_file(p),
                            None => e,
                        }
                    })?;
                schema.structs[owner.0].fields[i].ty = Type { kind, list: field.is_list };
            }
        }
    }

    check(&schema)?;

    for pkg in &schema.packages {
        debug!(package = %pkg.name, structs = pkg.structs.len(), "resolved package");
    }
    Ok(schema)
}

fn lookup(
    name: &str,
    package: PackageId,
    package_ids: &HashMap<&str, PackageId>,
    struct_ids: &HashMap<(PackageId, &str), StructId>,
    by_name: &HashMap<&str, Vec<StructId>>,
    schema: &Schema,
) -> Result<TypeKind, String> {
    if let Some(p) = Primitive::from_name(name) {
        return Ok(TypeKind::Primitive(p));
    }

    // Qualified: package/path.Name
    if let Some((pkg, local)) = name.rsplit_once('.') {
        let pkg_id = package_ids
            .get(pkg)
            .ok_or_else(|| format!("The package {} is not defined", quote(pkg)))?;
        return struct_ids
            .get(&(*pkg_id, local))
            .map(|&id| TypeKind::Struct(id))
            .ok_or_else(|| format!("The type {} is not defined", quote(name)));
    }

    if let Some(&id) = struct_ids.get(&(package, name)) {
        return Ok(TypeKind::Struct(id));
    }

    match by_name.get(name).map(|ids| ids.as_slice()) {
        Some([id]) => Ok(TypeKind::Struct(*id)),
        Some(ids) if ids.len() > 1 => {
            let packages: Vec<&str> = ids
                .iter()
                .map(|&id| schema.package_of(id).declared.as_str())
                .collect();
            Err(format!(
                "The type {} is ambiguous between packages {}",
                quote(name),
                packages.join(", ")
            ))
        }
        _ => Err(format!("The type {} is not defined", quote(name))),
    }
}

/// Final consistency check over the resolved IR.
pub fn check(schema: &Schema) -> Result<(), SchemaError> {
    for s in &schema.structs {
        if s.package.0 >= schema.packages.len() {
            return Err(SchemaError::new(
                format!("Struct {} has no package", quote(&s.name)),
                s.line,
                0,
            ));
        }
        if s.fields.len() > MAX_FIELDS {
            return Err(SchemaError::new(
                format!("Struct {} has more than {} fields", quote(&s.name), MAX_FIELDS),
                s.line,
                0,
            ));
        }
        for (i, f) in s.fields.iter().enumerate() {
            let unresolved = matches!(f.ty.kind, TypeKind::Struct(id) if id.0 >= schema.structs.len());
            if unresolved || f.index as usize != i {
                let e = SchemaError::new(
                    format!("Unresolved field {} in struct {}", quote(&f.name), quote(&s.name)),
                    f.line,
                    f.column,
                );
                return Err(match &s.file {
                    Some(p) => e.in_file(p),
                    None => e,
                });
            }
        }
    }
    Ok(())
}
