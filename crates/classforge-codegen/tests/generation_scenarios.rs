use classforge_codegen::{generate_from_json, ArtifactKind, DiagnosticKind, GenerationOutput, GeneratorConfig};
use serde_json::{json, Value};

fn run(document: Value) -> GenerationOutput {
    generate_from_json(&document.to_string(), &GeneratorConfig::default()).expect("parse")
}

fn content<'a>(output: &'a GenerationOutput, path: &str) -> &'a str {
    &output
        .artifact(path)
        .unwrap_or_else(|| panic!("missing artifact {path}"))
        .content
}

fn fk(name: &str, target: &str) -> Value {
    json!({ "name": name, "type": "Long", "isForeignKey": true, "referencedEntity": target })
}

fn pk(name: &str) -> Value {
    json!({ "name": name, "type": "Long", "isPrimaryKey": true })
}

#[test]
fn author_book_many_to_one() {
    let output = run(json!({
        "elements": [
            { "id": "a", "name": "Author", "type": "class", "attributes": [pk("id"), "name: String"] },
            { "id": "b", "name": "Book", "type": "class",
              "attributes": [pk("id"), "title: String", fk("author", "Author")] }
        ],
        "connections": [
            { "id": "r1", "source": "a", "target": "b", "type": "association",
              "sourceMultiplicity": "1", "targetMultiplicity": "*" }
        ]
    }));

    let book = content(&output, "entities/Book.java");
    assert!(book.contains("@ManyToOne(fetch = FetchType.LAZY)\n    @JoinColumn(name = \"author_id\")\n    private Author author;"));

    let author = content(&output, "entities/Author.java");
    assert!(author.contains("@OneToMany(mappedBy = \"author\")"));
    assert!(author.contains("private List<Book> books = new ArrayList<>();"));

    let dto = content(&output, "dto/BookDTO.java");
    assert!(dto.contains("private Long authorId;"));
    assert!(!dto.contains("Author author"));

    assert!(!output.artifacts.iter().any(|a| a.relative_path.ends_with("Id.java")));
    assert!(!book.contains("@ManyToMany"));
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
}

#[test]
fn direct_many_to_many_without_association_table() {
    let output = run(json!({
        "elements": [
            { "id": "s", "name": "Student", "type": "class", "attributes": [pk("id"), "name: String"] },
            { "id": "c", "name": "Course", "type": "class", "attributes": [pk("id"), "title: String"] }
        ],
        "connections": [
            { "id": "m", "source": "s", "target": "c", "type": "many-to-many-direct",
              "sourceMultiplicity": "*", "targetMultiplicity": "*" }
        ]
    }));

    let student = content(&output, "entities/Student.java");
    assert!(student.contains("@JoinTable("));
    assert!(student.contains("name = \"student_course\","));
    assert!(student.contains("joinColumns = @JoinColumn(name = \"student_id\"),"));
    assert!(student.contains("inverseJoinColumns = @JoinColumn(name = \"course_id\"))"));
    assert!(student.contains("private List<Course> courses = new ArrayList<>();"));

    let course = content(&output, "entities/Course.java");
    assert!(course.contains("@ManyToMany(mappedBy = \"courses\")"));
    assert!(course.contains("private List<Student> students = new ArrayList<>();"));

    assert_eq!(output.of_kind(ArtifactKind::Entity).count(), 2);
}

#[test]
fn association_table_yields_composite_key_join_entity() {
    let output = run(json!({
        "elements": [
            { "id": "s", "name": "Student", "type": "class", "attributes": [pk("id")] },
            { "id": "c", "name": "Course", "type": "class", "attributes": [pk("id")] },
            { "id": "e", "name": "Enrollment", "type": "class", "stereotype": "association_table",
              "attributes": [fk("studentId", "Student"), fk("courseId", "Course"), "grade: Double"] }
        ],
        "connections": [
            { "id": "m", "source": "s", "target": "c", "type": "many-to-many-direct",
              "sourceMultiplicity": "*", "targetMultiplicity": "*", "associationTable": "e" }
        ]
    }));

    let key = content(&output, "entities/EnrollmentId.java");
    assert!(key.contains("@Embeddable"));
    assert!(key.contains("private Long studentId;"));
    assert!(key.contains("private Long courseId;"));

    let join = content(&output, "entities/Enrollment.java");
    assert!(join.contains("@EmbeddedId"));
    assert!(join.contains("@MapsId(\"studentId\")"));
    assert!(join.contains("@MapsId(\"courseId\")"));
    assert!(join.contains("@Column(name = \"grade\")\n    private Double grade;"));
    assert!(join.contains("this.id.setStudentId(student != null ? student.getId() : null);"));
    assert!(join.contains("return Objects.equals(id, other.id);"));

    let repository = content(&output, "repositories/EnrollmentRepository.java");
    assert!(repository.contains("extends JpaRepository<Enrollment, EnrollmentId>"));
    assert!(repository.contains("List<Enrollment> findById_StudentId(Long studentId);"));

    for path in ["entities/Student.java", "entities/Course.java"] {
        let text = content(&output, path);
        assert!(!text.contains("@ManyToMany"), "{path}");
        assert!(!text.contains("List<"), "{path}");
    }
    for missing in [
        "dto/EnrollmentDTO.java",
        "mappers/EnrollmentMapper.java",
        "services/EnrollmentService.java",
        "controllers/EnrollmentController.java",
    ] {
        assert!(output.artifact(missing).is_none(), "{missing}");
    }
}

#[test]
fn inheritance_child_extends_parent_and_joins_on_own_key() {
    let output = run(json!({
        "elements": [
            { "id": "animal", "name": "Animal", "type": "class",
              "attributes": [pk("id"), "name: String", "weight: double"] },
            { "id": "dog", "name": "Dog", "type": "class",
              "attributes": [pk("id"), "name: String", "breed: String"] }
        ],
        "connections": [
            { "id": "inh", "source": "animal", "target": "dog", "type": "inheritance",
              "sourceMultiplicity": "1", "targetMultiplicity": "*" }
        ]
    }));

    let animal = content(&output, "entities/Animal.java");
    assert!(animal.contains("@Inheritance(strategy = InheritanceType.JOINED)"));

    let dog = content(&output, "entities/Dog.java");
    assert!(dog.contains("@PrimaryKeyJoinColumn(name = \"id\")"));
    assert!(dog.contains("public class Dog extends Animal {"));
    assert!(dog.contains("private String breed;"));
    assert!(!dog.contains("private Long id;"));
    assert!(!dog.contains("private String name;"));
    assert!(!dog.contains("getName()"));
    assert!(dog.contains("return getId() != null && Objects.equals(getId(), other.getId());"));

    let dto = content(&output, "dto/DogDTO.java");
    assert!(dto.contains("public class DogDTO extends AnimalDTO {"));
    assert!(!dto.contains("private Long id;"));

    let mapper = content(&output, "mappers/DogMapper.java");
    assert!(mapper.contains("dto.setName(entity.getName());"));
    assert!(mapper.contains("dto.setBreed(entity.getBreed());"));
}

#[test]
fn unrecognized_type_falls_back_to_association_with_warning() {
    let output = run(json!({
        "elements": [
            { "id": "a", "name": "Team", "type": "class", "attributes": [pk("id")] },
            { "id": "b", "name": "Player", "type": "class", "attributes": [pk("id")] }
        ],
        "connections": [
            { "id": "r", "source": "a", "target": "b", "type": "membership",
              "sourceMultiplicity": "1", "targetMultiplicity": "*" }
        ]
    }));

    assert!(content(&output, "entities/Player.java").contains("private Team team;"));
    let warnings: Vec<_> = output
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::Classification)
        .collect();
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert!(warnings[0].message.contains("membership"));
}

#[test]
fn services_resolve_every_reference_before_saving() {
    let output = run(json!({
        "elements": [
            { "id": "c", "name": "Customer", "type": "class", "attributes": [pk("id")] },
            { "id": "w", "name": "Warehouse", "type": "class", "attributes": [pk("id")] },
            { "id": "o", "name": "Shipment", "type": "class",
              "attributes": [pk("id"), fk("customerId", "Customer"), fk("origin", "Warehouse")] }
        ],
        "connections": []
    }));

    let service = content(&output, "services/ShipmentService.java");
    assert!(service.contains("CustomerRepository customerRepository"));
    assert!(service.contains("WarehouseRepository warehouseRepository"));
    assert!(service.contains("entity.setCustomer(customerRepository.findById(customerId)"));
    assert!(service.contains("entity.setOrigin(warehouseRepository.findById(originId)"));
    assert!(service.contains("\"Related Warehouse not found with id \" + originId"));

    let controller = content(&output, "controllers/ShipmentController.java");
    assert!(controller.contains("@RequestMapping(\"/api/shipments\")"));
    assert!(controller.contains("@GetMapping(\"/by-origin/{originId}\")"));
    assert!(controller.contains("@GetMapping(\"/{id}/customer-id\")"));
}

#[test]
fn base_package_flows_into_every_artifact() {
    let config = GeneratorConfig::default().with_base_package("org.acme.shop");
    let document = json!({
        "elements": [{ "id": "p", "name": "Product", "type": "class", "attributes": ["sku: String"] }],
        "connections": []
    });
    let output = generate_from_json(&document.to_string(), &config).expect("parse");
    for artifact in &output.artifacts {
        let package = format!("package org.acme.shop.{};", artifact.kind.directory());
        assert!(artifact.content.starts_with(&package), "{}", artifact.relative_path);
    }
}
